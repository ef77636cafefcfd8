use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Build the application router with all routes
pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::healthcheck))
        // Assessment routes
        .route("/api/assessments", get(handlers::assessments::list_assessments))
        .route("/api/assessments", post(handlers::assessments::create_assessment))
        .route("/api/assessments/latest", get(handlers::assessments::latest_assessment))
        .route("/api/assessments/:id", get(handlers::assessments::get_assessment))
        .route("/api/assessments/:id/report", get(handlers::assessments::get_assessment_report))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
