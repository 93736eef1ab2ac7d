use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{info, warn};
use std::rc::Rc;
use std::time::Instant;

use crate::auth::AuthenticatedUser;

/// Request logging middleware.
/// Logs every request with its outcome and, behind the JWT gate, the
/// authenticated subject.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
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
        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();

        info!("Request started: {} {}", method, path);

        let service = self.service.clone();

        Box::pin(async move {
            let res = match service.call(req).await {
                Ok(res) => res,
                Err(e) => {
                    // Rejections from inner middleware surface here before
                    // actix turns them into a response
                    warn!(
                        "Request rejected: {} {} - Status: {} ({}ms)",
                        method,
                        path,
                        e.as_response_error().status_code().as_u16(),
                        start_time.elapsed().as_millis()
                    );
                    return Err(e);
                }
            };

            let remote_user = res
                .request()
                .extensions()
                .get::<AuthenticatedUser>()
                .map(|user| user.username().to_string())
                .unwrap_or_else(|| "-".to_string());

            info!(
                "Request completed: {} {} - Status: {} - User: {} ({}ms)",
                method,
                path,
                res.status().as_u16(),
                remote_user,
                start_time.elapsed().as_millis()
            );

            Ok(res)
        })
    }
}
