pub mod api;
pub mod days;
pub mod home;
pub mod insights;
pub mod trips;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.config.upload_root.clone());
    Router::new()
        .merge(home::router())
        .merge(trips::router())
        .merge(days::router())
        .merge(insights::router())
        .nest("/api", api::router())
        .nest_service("/static", ServeDir::new("static"))
        .nest_service("/uploads", uploads)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Trims a form value and maps blank input to `None`.
pub(crate) fn normalize_optional(input: Option<String>) -> Option<String> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
