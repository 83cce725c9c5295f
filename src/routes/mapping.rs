use actix_web::web;
use log::info;

use crate::{
    config::Config,
    handlers::{
        create_handler, list_handler, probe_handler, public_create_handler, redirect_handler,
    },
    middleware::BasicAuth,
};

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let mut api = web::scope("/api").service(
        web::resource("/links")
            .wrap(BasicAuth::always(config.auth.clone()))
            .route(web::get().to(list_handler)),
    );

    if config.server.public_create_api {
        info!("Public creation endpoint enabled at /api/create");
        api = api.route("/create", web::get().to(public_create_handler));
    }

    cfg.route("/", web::post().to(create_handler))
        .service(api)
        .service(
            web::resource("/{code}")
                .route(web::get().to(redirect_handler))
                .route(web::head().to(probe_handler)),
        );
}
