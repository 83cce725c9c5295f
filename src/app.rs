use std::sync::Arc;

use actix_web::{
    middleware::Logger,
    web, App, HttpServer,
};
use env_logger::Env;
use log::{debug, info};

use crate::{
    config::{Config, Environment},
    errors::AppError,
    middleware::{BasicAuth, RequestLogger},
    routes, services,
    store::{KeyValueStore, RedisStore},
    types::AppState,
};

// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;

// Setup logging with custom format and configuration
fn setup_logging(config: &Config) -> AppResult<()> {
    let log_level = match config.app.environment {
        Environment::Development => config.app.log_level.clone(),
        Environment::Testing => "debug,actix_web=info".to_string(),
        Environment::Production => "info,actix_web=warn".to_string(),
    };

    let env = Env::default()
        .filter_or("RUST_LOG", log_level)
        .write_style_or("RUST_LOG_STYLE", "always");

    env_logger::try_init_from_env(env)
        .map_err(|e| AppError::Logger(format!("Failed to initialize logger: {}", e)))
}

pub async fn server() -> AppResult<()> {
    let config = Config::load()?;

    setup_logging(&config)?;

    info!("Starting {} v{}", config.app.name, config.app.version);
    info!("Environment: {:?}", config.app.environment);
    info!(
        "Binding to {}:{} with {} workers",
        config.server.host, config.server.port, config.server.workers
    );

    if config.app.environment == Environment::Development {
        debug!("Full configuration: {:?}", config.redacted());
    }

    // Refuse to start without a reachable store
    let store = RedisStore::connect(&config.store).await?;
    let store: Arc<dyn KeyValueStore> = Arc::new(store);

    // One service handle shared by every worker
    let shortener = services::register(store, &config.shortener);

    let enable_debug_logging = config.app.environment != Environment::Production;

    let log_format = if enable_debug_logging {
        "%a \"%r\" %s %b %T \"%{Referer}i\" \"%{User-Agent}i\" %{X-Request-ID}o"
    } else {
        "%a \"%r\" %s %b %T"
    };

    let state = web::Data::new(AppState::new(config.app.version.clone()));
    let app_config = config.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(shortener.clone())
            .app_data(web::Data::new(app_config.clone()))
            .wrap(BasicAuth::for_writes(app_config.auth.clone()))
            // Inside the access logger so `%{X-Request-ID}o` is populated
            .wrap(RequestLogger::new(enable_debug_logging))
            .wrap(Logger::new(log_format))
            .configure(|cfg| routes::configure_routes(cfg, &app_config))
    })
    .workers(config.server.workers)
    .bind((config.server.host.to_string(), config.server.port))?
    .run()
    .await?;

    Ok(())
}
