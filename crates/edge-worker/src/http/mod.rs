//! HTTP 인터페이스.

pub mod error;
pub mod health;
pub mod state;
pub mod ticker;

use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

pub use error::{ApiError, ApiErrorResponse};
pub use health::health_router;
pub use state::AppState;

/// 라우터 생성.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health_router())
        .route("/ticker-data", get(ticker::ticker_data))
        .route("/check-cache", get(ticker::check_cache))
        .route("/prewarm", post(ticker::prewarm))
        .route("/jobs/{id}", get(ticker::job_status))
        .route("/stats", get(ticker::stats))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
