//! 모든 핸들러에서 공유되는 상태.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use edge_data::{CacheStore, KeyValueStore};

use crate::dispatcher::Dispatcher;
use crate::stats::WorkerStats;

/// HTTP 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 레코드 캐시 (조회 전용)
    pub cache: Arc<CacheStore>,
    /// 작업 등록기
    pub dispatcher: Dispatcher,
    /// readiness 확인용 저장소
    pub store: Arc<dyn KeyValueStore>,
    /// 워커 통계
    pub stats: Arc<WorkerStats>,
    /// `POST /prewarm` 대상 티커
    pub prewarm_tickers: Vec<String>,
    pub version: String,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        cache: Arc<CacheStore>,
        dispatcher: Dispatcher,
        store: Arc<dyn KeyValueStore>,
        stats: Arc<WorkerStats>,
        prewarm_tickers: Vec<String>,
    ) -> Self {
        Self {
            cache,
            dispatcher,
            store,
            stats,
            prewarm_tickers,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// 저장소 연결 상태.
    pub async fn is_store_healthy(&self) -> bool {
        self.store.ping().await.unwrap_or(false)
    }
}
