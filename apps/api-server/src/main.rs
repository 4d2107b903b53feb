//! # Folio Chat Gateway
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

#[cfg(test)]
mod tests;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    telemetry::init_telemetry(&TelemetryConfig::from_env());

    // Load configuration
    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Folio chat gateway on {}:{}",
        config.host,
        config.port
    );

    // Build application state
    let state = AppState::new(&config)
        .await
        .map_err(std::io::Error::other)?;

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .configure(handlers::configure_routes(state.clone()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
