use actix_web::{http::StatusCode, web, HttpResponse, Responder};

use crate::{
    config::Config,
    services::SharedShortenerService,
    store::{StoreHealth, StoreHealthStatus},
    types::{AppState, HealthStatus, ResponsePayload},
};

mod mapping;

// Handler function for the root route "/"
async fn index() -> impl Responder {
    let welcome_message = ResponsePayload {
        status: 200,
        message: String::from("Shorten all the URLs"),
    };

    HttpResponse::Ok().json(welcome_message)
}

// Handler function for the health check endpoint
async fn health_check(
    data: web::Data<AppState>,
    service: web::Data<SharedShortenerService>,
) -> impl Responder {
    let uptime = data.start_time.elapsed().as_secs();
    let store = StoreHealth::probe(service.store()).await;

    let (code, label) = match store.status {
        StoreHealthStatus::Healthy => (StatusCode::OK, "OK"),
        StoreHealthStatus::Unhealthy => (StatusCode::SERVICE_UNAVAILABLE, "DEGRADED"),
    };

    let status = HealthStatus {
        status: String::from(label),
        version: data.version.clone(),
        store,
        uptime_seconds: uptime,
    };

    HttpResponse::build(code).json(status)
}

// Configure all routes function
pub fn configure_routes(cfg: &mut web::ServiceConfig, config: &Config) {
    cfg.route("/health", web::get().to(health_check));
    cfg.route("/", web::get().to(index));
    // Catch-all `/{code}` goes last
    mapping::configure(cfg, config);
}
