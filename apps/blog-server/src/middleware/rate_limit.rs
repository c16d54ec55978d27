//! Rate limiting middleware for anonymous form submissions.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{Method, header},
};
use blog_shared::ErrorResponse;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use blog_core::ports::RateLimiter;

/// Throttles POST requests per client address. Other methods pass through.
///
/// The client is the socket peer IP. `Forwarded` / `X-Forwarded-For` are only
/// honoured when `trust_forwarded` is set, i.e. behind a reverse proxy that
/// overwrites them.
#[derive(Clone)]
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
    trust_forwarded: bool,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<dyn RateLimiter>, trust_forwarded: bool) -> Self {
        Self {
            limiter,
            trust_forwarded,
        }
    }
}

fn client_key(req: &ServiceRequest, trust_forwarded: bool) -> String {
    if trust_forwarded {
        let info = req.connection_info();
        if let Some(forwarded) = info.realip_remote_addr() {
            if info.peer_addr() != Some(forwarded) {
                return forwarded.to_string();
            }
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            trust_forwarded: self.trust_forwarded,
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Arc<dyn RateLimiter>,
    trust_forwarded: bool,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let limiter = self.limiter.clone();
        let trust_forwarded = self.trust_forwarded;

        Box::pin(async move {
            if *req.method() != Method::POST {
                return service.call(req).await.map(|res| res.map_into_left_body());
            }

            let key = client_key(&req, trust_forwarded);

            match limiter.check(&key).await {
                Ok(result) if !result.allowed => {
                    let retry_after = result.retry_after.as_secs().max(1);
                    tracing::warn!(client = %key, path = req.path(), "Rate limit exceeded");

                    let response = HttpResponse::TooManyRequests()
                        .insert_header((header::RETRY_AFTER, retry_after.to_string()))
                        .json(ErrorResponse::too_many_requests(retry_after));

                    Ok(req.into_response(response).map_into_right_body())
                }
                other => {
                    // Fail open on limiter errors.
                    if let Err(e) = other {
                        tracing::error!("Rate limiter error, failing open: {}", e);
                    }
                    service.call(req).await.map(|res| res.map_into_left_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use async_trait::async_trait;
    use blog_core::ports::{RateLimitError, RateLimitResult};

    struct BrokenLimiter;

    #[async_trait]
    impl RateLimiter for BrokenLimiter {
        async fn check(&self, _key: &str) -> Result<RateLimitResult, RateLimitError> {
            Err(RateLimitError::Backend("store unavailable".to_string()))
        }
    }

    #[actix_web::test]
    async fn test_limiter_errors_fail_open() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(Arc::new(BrokenLimiter), false))
                .route("/", web::post().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let req = test::TestRequest::post().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[::core::prelude::v1::test]
    fn test_client_key_uses_peer_ip() {
        let req = test::TestRequest::post()
            .peer_addr("10.0.0.7:40000".parse().unwrap())
            .insert_header(("x-forwarded-for", "203.0.113.9"))
            .to_srv_request();
        assert_eq!(client_key(&req, false), "10.0.0.7");
        assert_eq!(client_key(&req, true), "203.0.113.9");

        let req = test::TestRequest::post()
            .peer_addr("10.0.0.7:40001".parse().unwrap())
            .to_srv_request();
        assert_eq!(client_key(&req, true), "10.0.0.7");
    }
}
