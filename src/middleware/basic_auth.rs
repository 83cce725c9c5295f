use std::rc::Rc;
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use actix_web::http::Method;
use actix_web::{Error, HttpResponse};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use log::warn;

use crate::auth::{authorize, Authorization, REALM};
use crate::config::AuthConfig;

/// Gates requests behind [`authorize`], answering 401 on denial.
#[derive(Clone)]
pub struct BasicAuth {
    config: Arc<AuthConfig>,
    protect_reads: bool,
}

impl BasicAuth {
    /// Checks every method except GET and HEAD
    pub fn for_writes(config: AuthConfig) -> Self {
        Self {
            config: Arc::new(config),
            protect_reads: false,
        }
    }

    /// Checks every request, reads included
    pub fn always(config: AuthConfig) -> Self {
        Self {
            config: Arc::new(config),
            protect_reads: true,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BasicAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = BasicAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(BasicAuthMiddleware {
            service: Rc::new(service),
            config: Arc::clone(&self.config),
            protect_reads: self.protect_reads,
        })
    }
}

pub struct BasicAuthMiddleware<S> {
    service: Rc<S>,
    config: Arc<AuthConfig>,
    protect_reads: bool,
}

impl<S, B> Service<ServiceRequest> for BasicAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let is_read = matches!(*req.method(), Method::GET | Method::HEAD);
        let outcome = if is_read && !self.protect_reads {
            Authorization::Granted
        } else {
            authorize(req.headers().get(AUTHORIZATION), &self.config)
        };

        match outcome {
            Authorization::Granted => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Authorization::Denied => {
                warn!("Rejected unauthorized {} {}", req.method(), req.path());
                let response = HttpResponse::Unauthorized()
                    .insert_header((WWW_AUTHENTICATE, format!("Basic realm=\"{}\"", REALM)))
                    .body("Not authorized\n");
                Box::pin(ok(req.into_response(response).map_into_right_body()))
            }
        }
    }
}
