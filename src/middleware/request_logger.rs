use std::rc::Rc;
use std::time::Instant;

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::Error;
use futures_util::future::{ok, LocalBoxFuture, Ready};
use log::debug;
use uuid::Uuid;

/// Header carrying the per-request id, on both request and response
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags every request with an `X-Request-ID` and, when enabled, traces its
/// start, outcome and latency at debug level.
pub struct RequestLogger {
    enable_debug_logging: bool,
}

impl RequestLogger {
    pub fn new(enable_debug_logging: bool) -> Self {
        Self { enable_debug_logging }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggerMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestLoggerMiddleware {
            service: Rc::new(service),
            enable_debug_logging: self.enable_debug_logging,
        })
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: Rc<S>,
    enable_debug_logging: bool,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        // Reuse a client-supplied id, otherwise mint one for this request
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .cloned()
            .or_else(|| HeaderValue::from_str(&Uuid::new_v4().to_string()).ok());
        if let Some(id) = &request_id {
            req.headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), id.clone());
        }

        let service = self.service.clone();
        let enable_debug_logging = self.enable_debug_logging;
        let path = req.path().to_owned();
        let method = req.method().clone();
        let label = request_id
            .as_ref()
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_owned();
        let started = Instant::now();

        if enable_debug_logging {
            debug!("[{}] Processing request: {} {}", label, method, path);
        }

        Box::pin(async move {
            let mut res = service.call(req).await?;
            if let Some(id) = request_id {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), id);
            }

            if enable_debug_logging {
                debug!(
                    "[{}] Response: {} {} - status: {} in {:?}",
                    label,
                    method,
                    path,
                    res.status(),
                    started.elapsed()
                );
            }
            Ok(res)
        })
    }
}
