//! 작업 하나의 처리 흐름.
//!
//! 1. 캐시 조회. 적중하면 바로 완료 (user 작업만 알림)
//! 2. 티커 잠금 시도. 바쁘면 `Locked`로 완료 (데이터, 알림 없음)
//! 3. 집계. 실패하면 대체 레코드 생성
//! 4. 캐시 저장
//! 5. 잠금 해제 (모든 종료 경로)
//! 6. user 작업이면 알림
//!
//! 재시도는 스크래퍼 내부에만 있습니다. 작업은 저장소 장애일 때만 실패합니다.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use edge_core::{AppConfig, CompositeRecord, Job, JobOutcome, Ticker};
use edge_data::{CacheStore, DistributedLock, FallbackGenerator, RecordAggregator};
use edge_notification::Notifier;

use crate::error::Result;

/// 티커 처리 파이프라인.
pub struct TickerPipeline {
    cache: Arc<CacheStore>,
    lock: DistributedLock,
    aggregator: Arc<dyn RecordAggregator>,
    fallback: FallbackGenerator,
    notifier: Notifier,
    cache_ttl: Duration,
    lock_ttl: Duration,
}

impl TickerPipeline {
    pub fn new(
        cache: Arc<CacheStore>,
        lock: DistributedLock,
        aggregator: Arc<dyn RecordAggregator>,
        notifier: Notifier,
    ) -> Self {
        Self {
            cache,
            lock,
            aggregator,
            fallback: FallbackGenerator::random(),
            notifier,
            cache_ttl: Duration::from_secs(7200),
            lock_ttl: Duration::from_secs(300),
        }
    }

    /// 설정의 TTL을 적용합니다.
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.cache_ttl = config.cache.ttl();
        self.lock_ttl = config.lock.ttl();
        self
    }

    pub fn with_ttls(mut self, cache_ttl: Duration, lock_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self.lock_ttl = lock_ttl;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackGenerator) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// 작업을 처리합니다.
    #[instrument(
        name = "job",
        skip(self, job),
        fields(job_id = %job.id, ticker = %job.ticker(), kind = %job.kind)
    )]
    pub async fn process(&self, job: &Job) -> Result<JobOutcome> {
        let ticker = job.ticker();
        let notify = job.kind.notifies();

        if let Some(record) = self.cache.get(ticker).await? {
            info!("Cache hit");
            if notify {
                self.notifier.job_completed(ticker, &record).await;
            }
            return Ok(JobOutcome::Cached);
        }

        let name = job.payload.name.clone();
        let produced = self
            .lock
            .with_lock(ticker, self.lock_ttl, || self.produce(ticker, name))
            .await?;

        let Some(record) = produced else {
            info!("Ticker locked by another worker, skipping");
            return Ok(JobOutcome::Locked);
        };

        let outcome = if record.is_synthetic() {
            JobOutcome::Synthetic
        } else {
            JobOutcome::Fresh
        };

        if notify {
            self.notifier.job_completed(ticker, &record).await;
        }

        info!(outcome = %outcome, "Job completed");
        Ok(outcome)
    }

    /// 잠금을 잡은 상태에서 실행: 집계 또는 대체 생성, 캐시 저장.
    async fn produce(
        &self,
        ticker: &Ticker,
        name: Option<String>,
    ) -> edge_data::Result<CompositeRecord> {
        let record = match self.aggregator.aggregate(ticker, name.clone()).await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Aggregation failed, generating fallback record");
                self.fallback.generate(ticker, name)
            }
        };

        self.cache.put(ticker, &record, self.cache_ttl).await?;
        Ok(record)
    }
}
