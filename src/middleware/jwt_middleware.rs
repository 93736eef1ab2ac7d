/// JWT Authentication Middleware
///
/// Validates the bearer token of every request to a wrapped scope and
/// injects the authenticated subject into request extensions for use by
/// route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{JwtAuth, RequestContext};

/// JWT middleware for protecting routes
///
/// Must be applied to routes that require authentication.
/// Failures short-circuit with the realm's `401` before the handler runs.
pub struct JwtMiddleware {
    auth: web::Data<JwtAuth>,
}

impl JwtMiddleware {
    /// Create new JWT middleware instance
    pub fn new(auth: web::Data<JwtAuth>) -> Self {
        Self { auth }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            auth: self.auth.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    auth: web::Data<JwtAuth>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let mut context = RequestContext::new(req.method().as_str(), req.path());
        if let Some(peer) = req.peer_addr() {
            context = context.with_peer_addr(peer.to_string());
        }

        // A header that is not visible ASCII is treated like a missing one
        let authorization = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match self.auth.verify(authorization, &context) {
            Ok(user) => {
                req.extensions_mut().insert(user);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                let rejection = self.auth.reject(e);
                Box::pin(async move { Err(rejection.into()) })
            }
        }
    }
}
