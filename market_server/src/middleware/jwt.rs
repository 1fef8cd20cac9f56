//! Bearer token middleware for Actix Web.
//!
//! Wrap any scope that needs an authenticated caller with this middleware. It reads the `Authorization: Bearer`
//! header, validates the token with [`TokenValidator`], and stores the resulting [`JwtClaims`] in the request
//! extensions, where handlers and [`super::AclMiddlewareFactory`] pick them up.
//!
//! Requests without a valid token are rejected with a 401 response before they reach the handler.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};

use crate::{
    auth::{bearer_token, TokenValidator},
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory {
    validator: TokenValidator,
}

impl JwtMiddlewareFactory {
    pub fn new(validator: TokenValidator) -> Self {
        JwtMiddlewareFactory { validator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareService { validator: Rc::new(self.validator.clone()), service: Rc::new(service) }))
    }
}

pub struct JwtMiddlewareService<S> {
    validator: Rc<TokenValidator>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let validator = Rc::clone(&self.validator);
        Box::pin(async move {
            trace!("🔐️ Checking access token for request");
            let header = req.headers().get(AUTHORIZATION).ok_or_else(|| {
                warn!("🔐️ No access token found in request to {}. Denying access.", req.path());
                ServerError::AuthenticationError(AuthError::MissingToken)
            })?;
            let header = header
                .to_str()
                .map_err(|e| ServerError::AuthenticationError(AuthError::PoorlyFormattedToken(e.to_string())))?;
            let token = bearer_token(header).map_err(ServerError::AuthenticationError)?;
            let claims = validator.validate(token).map_err(|e| {
                warn!("🔐️ Invalid access token in request to {}. {e}", req.path());
                ServerError::AuthenticationError(e)
            })?;
            trace!("🔐️ Access token for {} ✅️", claims.sub);
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
