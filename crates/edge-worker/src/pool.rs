//! 동시 실행 수가 제한된 워커 풀.
//!
//! 세마포어 permit을 먼저 얻은 뒤에만 큐에서 작업을 꺼내므로, 초과 작업은
//! 큐에 남아 다른 워커 프로세스가 가져갈 수 있습니다.

use chrono::Duration as ChronoDuration;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

use edge_core::{Job, JobOutcome, WorkerConfig};
use edge_data::lock::panic_message;

use crate::error::{Result, WorkerError};
use crate::pipeline::TickerPipeline;
use crate::queue::JobQueue;
use crate::registry::JobRegistry;
use crate::stats::WorkerStats;

/// 큐가 비어 있을 때 레지스트리에서 정리할 종료 작업의 보관 기간.
const REGISTRY_RETENTION_SECS: i64 = 3600;

/// 워커 풀.
pub struct WorkerPool {
    queue: Arc<dyn JobQueue>,
    pipeline: Arc<TickerPipeline>,
    registry: Arc<JobRegistry>,
    stats: Arc<WorkerStats>,
    concurrency: usize,
    poll_timeout: Duration,
    shutdown_grace: Duration,
}

impl WorkerPool {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        pipeline: Arc<TickerPipeline>,
        registry: Arc<JobRegistry>,
        stats: Arc<WorkerStats>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            queue,
            pipeline,
            registry,
            stats,
            concurrency: config.concurrency.max(1),
            poll_timeout: config.poll_timeout(),
            shutdown_grace: config.shutdown_grace(),
        }
    }

    /// 종료 토큰이 취소될 때까지 작업을 처리합니다.
    ///
    /// 취소 후에는 새 작업을 꺼내지 않고, 실행 중인 작업이 끝나기를
    /// 최대 `shutdown_grace`만큼 기다립니다.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        info!(concurrency = self.concurrency, "Worker pool started");

        loop {
            let permit = tokio::select! {
                _ = shutdown.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => {
                    permit.map_err(|e| WorkerError::Queue(e.to_string()))?
                }
            };

            if shutdown.is_cancelled() {
                break;
            }

            // pop은 제한 시간이 있으므로 취소와 경쟁시키지 않음 (꺼낸 작업 유실 방지)
            match self.queue.pop(self.poll_timeout).await {
                Ok(Some(job)) => self.spawn_job(job, permit),
                Ok(None) => {
                    drop(permit);
                    self.registry
                        .prune(ChronoDuration::seconds(REGISTRY_RETENTION_SECS))
                        .await;
                }
                Err(e) => {
                    drop(permit);
                    error!(error = %e, "Queue pop failed, backing off");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.poll_timeout) => {}
                    }
                }
            }
        }

        info!("Shutdown requested, draining running jobs");
        let drained = tokio::time::timeout(
            self.shutdown_grace,
            semaphore.acquire_many(self.concurrency as u32),
        )
        .await;

        match drained {
            Ok(_) => info!("All running jobs finished"),
            Err(_) => warn!(
                grace_secs = self.shutdown_grace.as_secs(),
                "Shutdown grace elapsed with jobs still running"
            ),
        }
        self.stats.log_summary();
        Ok(())
    }

    fn spawn_job(&self, job: Job, permit: OwnedSemaphorePermit) {
        let pipeline = self.pipeline.clone();
        let registry = self.registry.clone();
        let stats = self.stats.clone();

        let span = edge_core::job_span!("worker", job.ticker(), job.id);
        tokio::spawn(
            async move {
                let _permit = permit;
                execute(&pipeline, &registry, &stats, &job).await;
            }
            .instrument(span),
        );
    }
}

/// 작업 하나를 실행하고 상태와 통계를 기록합니다.
///
/// 파이프라인 밖으로 새어 나온 패닉도 실패로 기록합니다.
pub async fn execute(
    pipeline: &TickerPipeline,
    registry: &JobRegistry,
    stats: &WorkerStats,
    job: &Job,
) -> Option<JobOutcome> {
    registry.running(job).await;
    debug!(job_id = %job.id, "Job started");

    let result = AssertUnwindSafe(pipeline.process(job))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(WorkerError::Panicked(panic_message(panic.as_ref()))));

    match result {
        Ok(outcome) => {
            registry.completed(&job.id, outcome).await;
            stats.record(outcome);
            Some(outcome)
        }
        Err(e) => {
            error!(job_id = %job.id, ticker = %job.ticker(), error = %e, "Job failed");
            registry.failed(&job.id, e.to_string()).await;
            stats.record_failure();
            None
        }
    }
}
