//! 티커 데이터 endpoint.
//!
//! - `GET /ticker-data?ticker=&name=`: 캐시 적중이면 레코드, 아니면 user 작업 등록 후 202
//! - `GET /check-cache?ticker=`: 캐시 여부
//! - `POST /prewarm`: 설정된 티커 목록 프리웜 등록
//! - `GET /jobs/{id}`: 작업 상태
//! - `GET /stats`: 처리 통계

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use edge_core::{CompositeRecord, JobId, JobKind, JobPayload, Ticker};

use super::error::ApiError;
use super::state::AppState;
use crate::dispatcher::PrewarmSummary;
use crate::registry::JobEntry;

/// 티커 조회 쿼리.
#[derive(Debug, Default, Deserialize)]
pub struct TickerQuery {
    pub ticker: Option<String>,
    pub name: Option<String>,
}

impl TickerQuery {
    fn ticker(&self) -> Result<Ticker, ApiError> {
        let raw = self
            .ticker
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("MISSING_TICKER", "ticker is required"))?;

        Ticker::parse(raw).map_err(|e| ApiError::bad_request("INVALID_TICKER", e.to_string()))
    }
}

/// 캐시 확인 응답.
#[derive(Debug, Serialize)]
pub struct CheckCacheResponse {
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<CompositeRecord>,
}

/// 티커 데이터 조회.
///
/// GET /ticker-data
pub async fn ticker_data(
    State(state): State<AppState>,
    Query(query): Query<TickerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let ticker = query.ticker()?;

    if let Some(record) = state.cache.get(&ticker).await? {
        let body = json!({
            "status": "success",
            "source": "cache",
            "data": record,
        });
        return Ok((StatusCode::OK, Json(body)));
    }

    let enqueued = state
        .dispatcher
        .enqueue(JobKind::User, JobPayload::new(ticker.clone(), query.name.clone()))
        .await?;

    let body = json!({
        "status": "processing",
        "ticker": ticker,
        "job_id": enqueued.job_id,
    });
    Ok((StatusCode::ACCEPTED, Json(body)))
}

/// 캐시 여부 확인.
///
/// GET /check-cache
pub async fn check_cache(
    State(state): State<AppState>,
    Query(query): Query<TickerQuery>,
) -> Result<Json<CheckCacheResponse>, ApiError> {
    let ticker = query.ticker()?;
    let data = state.cache.get(&ticker).await?;

    Ok(Json(CheckCacheResponse {
        cached: data.is_some(),
        data,
    }))
}

/// 프리웜 작업 등록.
///
/// POST /prewarm
pub async fn prewarm(State(state): State<AppState>) -> Result<Json<PrewarmSummary>, ApiError> {
    let summary = state
        .dispatcher
        .enqueue_prewarm(&state.prewarm_tickers)
        .await?;
    Ok(Json(summary))
}

/// 작업 상태 조회.
///
/// GET /jobs/{id}
pub async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobEntry>, ApiError> {
    state
        .dispatcher
        .registry()
        .get(&JobId::from(id.clone()))
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("job not found: {}", id)))
}

/// 처리 통계.
///
/// GET /stats
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "jobs": state.stats.snapshot(),
        "registry": state.dispatcher.registry().counts().await,
        "cache": state.cache.stats(),
    }))
}
