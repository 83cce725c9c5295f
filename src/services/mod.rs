use std::sync::Arc;

use actix_web::web;

mod shortener;

pub use shortener::{
    SharedShortenerService, Shortened, ShortenerService, ShortenerServiceTrait,
};

use crate::{config::ShortenerConfig, store::KeyValueStore};

/// Service Register
///
/// Builds the shortener once; the returned handle is cloned into every
/// worker so all of them share one store connection.
pub fn register(
    store: Arc<dyn KeyValueStore>,
    config: &ShortenerConfig,
) -> web::Data<SharedShortenerService> {
    web::Data::new(ShortenerService::new(store, config))
}
