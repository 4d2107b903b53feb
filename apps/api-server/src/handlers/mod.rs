//! HTTP handlers and route configuration.

mod chat;
mod health;

use actix_web::{HttpRequest, error::JsonPayloadError, web};

use crate::middleware::error::{AppError, AppResult};
use crate::middleware::rate_limit::AdmissionMiddleware;
use crate::state::AppState;

/// Largest accepted chat body, in bytes.
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Configure all application routes and their shared data.
pub fn configure_routes(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let guard = state.guard.clone();

        cfg.app_data(web::Data::new(state))
            .app_data(
                web::JsonConfig::default()
                    .limit(MAX_BODY_BYTES)
                    .error_handler(json_error),
            )
            .service(
                web::scope("/api")
                    // Public routes
                    .route("/health", web::get().to(health::health_check))
                    // Rate limited routes
                    .service(
                        web::resource("/chat")
                            .wrap(AdmissionMiddleware::new(guard))
                            .route(web::post().to(chat::chat))
                            .default_service(web::to(post_only)),
                    )
                    .default_service(web::to(not_found)),
            );
    }
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "Rejected chat body");
    AppError::BadRequest("Invalid request body".to_string()).into()
}

async fn not_found() -> AppResult<actix_web::HttpResponse> {
    Err(AppError::NotFound)
}

async fn post_only() -> AppResult<actix_web::HttpResponse> {
    Err(AppError::MethodNotAllowed("POST"))
}
