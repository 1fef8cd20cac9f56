use actix_web::{
    body::MessageBody,
    http::{header::AUTHORIZATION, StatusCode},
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use log::debug;
use serde_json::Value;

use crate::{
    auth::{JwtClaims, Role, TokenValidator},
    config::AuthConfig,
    middleware::JwtMiddlewareFactory,
};

// Only ever used to sign tokens in these tests.
pub const TEST_SECRET: &str = "endpoint-tests-only-hs256-secret-0123456789";

pub fn issue_token(sub: &str, roles: Vec<Role>, expires_in: Duration) -> String {
    let claims = JwtClaims { sub: sub.to_string(), roles, exp: (Utc::now() + expires_in).timestamp() };
    let key = EncodingKey::from_secret(TEST_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).expect("Failed to sign token")
}

pub fn user_token(sub: &str) -> String {
    issue_token(sub, vec![Role::User], Duration::hours(1))
}

pub fn admin_token(sub: &str) -> String {
    issue_token(sub, vec![Role::User, Role::Admin], Duration::hours(1))
}

/// Sends the request through an app that authenticates callers exactly like the production `/api` scope.
pub async fn send_request<F>(req: TestRequest, token: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let req = if token.is_empty() {
        req
    } else {
        req.insert_header((AUTHORIZATION, format!("Bearer {token}")))
    };
    let validator = TokenValidator::new(&AuthConfig::new(TEST_SECRET));
    let app = App::new().wrap(JwtMiddlewareFactory::new(validator)).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub async fn get_request<F>(token: &str, path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::get().uri(path), token, configure).await
}

pub async fn delete_request<F>(token: &str, path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::delete().uri(path), token, configure).await
}

pub async fn post_request<F>(token: &str, path: &str, body: Value, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::post().uri(path).set_json(body), token, configure).await
}

pub async fn put_request<F>(token: &str, path: &str, body: Value, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::put().uri(path).set_json(body), token, configure).await
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).expect("Response body is not valid JSON")
}
