//! A minimal URL shortener.
//!
//! Mappings from short code to target URL live in a [`store::KeyValueStore`];
//! the [`services::ShortenerService`] generates codes, resolves collisions and
//! enumerates mappings on top of it. The HTTP layer in [`routes`] and
//! [`handlers`] is thin glue around the service.

pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod types;
pub mod utils;
pub mod validations;
