//! 작업 등록.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use edge_core::{Job, JobId, JobKind, JobPayload, Ticker};

use crate::error::Result;
use crate::queue::JobQueue;
use crate::registry::JobRegistry;

/// 등록 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enqueued {
    pub job_id: JobId,
    /// 같은 날 이미 등록된 프리웜이라 건너뜀
    pub duplicate: bool,
}

/// 프리웜 일괄 등록 결과.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrewarmSummary {
    pub jobs_added: usize,
    pub skipped: usize,
}

/// 큐와 레지스트리를 묶은 등록기.
#[derive(Clone)]
pub struct Dispatcher {
    queue: Arc<dyn JobQueue>,
    registry: Arc<JobRegistry>,
}

impl Dispatcher {
    pub fn new(queue: Arc<dyn JobQueue>, registry: Arc<JobRegistry>) -> Self {
        Self { queue, registry }
    }

    /// 작업을 등록하고 식별자를 반환합니다.
    #[instrument(skip(self, payload), fields(ticker = %payload.ticker))]
    pub async fn enqueue(&self, kind: JobKind, payload: JobPayload) -> Result<Enqueued> {
        let job = match kind {
            JobKind::User => Job::user(payload),
            JobKind::Prewarm => Job::prewarm(payload, Utc::now()),
        };

        if !self.queue.push(&job).await? {
            return Ok(Enqueued {
                job_id: job.id,
                duplicate: true,
            });
        }

        self.registry.queued(&job).await;
        info!(job_id = %job.id, kind = %job.kind, "Job enqueued");

        Ok(Enqueued {
            job_id: job.id,
            duplicate: false,
        })
    }

    /// 티커 목록 전체를 프리웜 작업으로 등록합니다.
    ///
    /// 잘못된 심볼과 중복은 건너뜁니다. 큐 장애는 즉시 에러로 반환합니다.
    pub async fn enqueue_prewarm(&self, tickers: &[String]) -> Result<PrewarmSummary> {
        let mut summary = PrewarmSummary::default();

        for raw in tickers {
            let ticker = match Ticker::parse(raw) {
                Ok(ticker) => ticker,
                Err(e) => {
                    warn!(ticker = %raw, error = %e, "Skipping invalid prewarm ticker");
                    summary.skipped += 1;
                    continue;
                }
            };

            let enqueued = self
                .enqueue(JobKind::Prewarm, JobPayload::new(ticker, None))
                .await?;
            if enqueued.duplicate {
                summary.skipped += 1;
            } else {
                summary.jobs_added += 1;
            }
        }

        info!(
            jobs_added = summary.jobs_added,
            skipped = summary.skipped,
            "Prewarm jobs enqueued"
        );
        Ok(summary)
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn queue(&self) -> &Arc<dyn JobQueue> {
        &self.queue
    }
}
