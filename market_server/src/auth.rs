//! Identity tokens.
//!
//! Users are identified by an HS256-signed JWT in the `Authorization: Bearer` header. The server does not issue these
//! tokens; it trusts any token signed with the configured secret. The `sub` claim is the user id, and `roles` lists
//! the roles granted to the user.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use log::debug;
use market_engine::db_types::UserId;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    pub exp: i64,
}

impl JwtClaims {
    pub fn user_id(&self) -> UserId {
        UserId::from(self.sub.as_str())
    }

    /// Every authenticated caller is a user, whether or not the token says so.
    pub fn has_role(&self, role: Role) -> bool {
        role == Role::User || self.roles.contains(&role)
    }
}

/// Handlers can take `JwtClaims` as an argument once [`crate::middleware::JwtMiddlewareFactory`] has accepted the
/// request.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway.num_seconds().max(0).unsigned_abs();
        Self { key, validation }
    }

    pub fn validate<S: AsRef<str>>(&self, token: S) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token.as_ref(), &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::ValidationError("The token has no subject".to_string()));
        }
        debug!("Access token validated for {}", data.claims.sub);
        Ok(data.claims)
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected 'Bearer <token>'".to_string()))?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::PoorlyFormattedToken("Expected 'Bearer <token>'".to_string()));
    }
    Ok(token.trim())
}
