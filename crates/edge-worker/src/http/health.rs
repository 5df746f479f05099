//! 헬스 체크 endpoint.
//!
//! 호스트(오케스트레이터)가 워커 프로세스를 회수하지 않도록 liveness/readiness를 제공합니다.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use super::state::AppState;
use crate::stats::WorkerStatsSnapshot;

/// readiness 응답.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// "healthy" | "unhealthy"
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
    pub timestamp: String,
    /// 저장소 상태 ("up" | "down")
    pub store: String,
    pub queue_depth: Option<usize>,
    pub jobs: Option<WorkerStatsSnapshot>,
}

/// 간단한 헬스 체크 (liveness probe용).
///
/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 저장소 연결까지 확인하는 헬스 체크 (readiness probe용).
///
/// GET /health/ready
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let store_up = state.is_store_healthy().await;
    let queue_depth = state.dispatcher.queue().len().await.ok();

    let (status, code) = if store_up {
        ("healthy", StatusCode::OK)
    } else {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    };

    let response = ReadyResponse {
        status: status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        store: if store_up { "up" } else { "down" }.to_string(),
        queue_depth,
        jobs: Some(state.stats.snapshot()),
    };

    (code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
