#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the stay score application.
//!
//! Serves the safety REST API consumed by the map frontend. Boundary
//! datasets are loaded once at startup; crime stats are fetched lazily
//! per city and cached inside the adapters.

mod handlers;

use std::path::Path;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use stay_score_safety::SafetyRegistry;

/// Shared application state.
pub struct AppState {
    /// City adapter registry.
    pub registry: Arc<SafetyRegistry>,
}

/// Starts the stay score API server.
///
/// Loads every city's boundary dataset from the data directory and
/// starts the Actix-Web HTTP server. This is a regular async function —
/// the caller is responsible for providing the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind
/// or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    log::info!("Loading boundary datasets from {data_dir}...");
    let registry = Arc::new(SafetyRegistry::from_data_dir(Path::new(&data_dir)));
    log::info!("Registered cities: {}", registry.city_keys().join(", "));

    let state = web::Data::new(AppState { registry });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(4000);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/safety/{city}/areas", web::get().to(handlers::city_areas))
                    .route("/safety/{city}/point", web::get().to(handlers::city_point)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
