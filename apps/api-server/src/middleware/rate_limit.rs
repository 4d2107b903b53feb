//! Admission middleware - rate limits chat requests before the handler runs.

use actix_web::{
    Error, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::Method,
    http::header::{HeaderName, HeaderValue},
};
use futures::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;
use std::sync::Arc;

use folio_core::AdmissionGuard;
use folio_core::domain::Admission;
use folio_shared::headers::{RATE_LIMIT_LIMIT, RATE_LIMIT_REMAINING, RATE_LIMIT_RESET};

use super::error::AppError;

/// `X-RateLimit-*` headers describing an admission decision.
pub fn rate_limit_headers(admission: &Admission) -> [(HeaderName, HeaderValue); 3] {
    [
        (
            HeaderName::from_static(RATE_LIMIT_LIMIT),
            HeaderValue::from(admission.limit),
        ),
        (
            HeaderName::from_static(RATE_LIMIT_REMAINING),
            HeaderValue::from(admission.remaining),
        ),
        (
            HeaderName::from_static(RATE_LIMIT_RESET),
            HeaderValue::from(admission.reset_at_millis()),
        ),
    ]
}

/// Admission middleware factory.
pub struct AdmissionMiddleware {
    guard: Arc<AdmissionGuard>,
}

impl AdmissionMiddleware {
    pub fn new(guard: Arc<AdmissionGuard>) -> Self {
        Self { guard }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdmissionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AdmissionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdmissionMiddlewareService {
            service: Rc::new(service),
            guard: self.guard.clone(),
        }))
    }
}

pub struct AdmissionMiddlewareService<S> {
    service: Rc<S>,
    guard: Arc<AdmissionGuard>,
}

impl<S, B> Service<ServiceRequest> for AdmissionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let guard = self.guard.clone();

        Box::pin(async move {
            // Only chat submissions count against the quota
            if req.method() != Method::POST {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            let client = guard.identify(
                req.headers()
                    .get("x-forwarded-for")
                    .and_then(|v| v.to_str().ok()),
            );

            let admission = guard.admit(&client).await;

            if !admission.allowed {
                let response = AppError::TooManyRequests(admission).error_response();
                let (http_req, _payload) = req.into_parts();
                return Ok(ServiceResponse::new(http_req, response).map_into_right_body());
            }

            let mut res = service.call(req).await?;

            // A provider denial already carries its own metadata
            let headers = res.headers_mut();
            for (name, value) in rate_limit_headers(&admission) {
                if !headers.contains_key(&name) {
                    headers.insert(name, value);
                }
            }

            Ok(res.map_into_left_body())
        })
    }
}
