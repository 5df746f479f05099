//! 작업 상태 레지스트리.
//!
//! 프로세스 로컬 관측용입니다. 큐와 달리 인스턴스 간에 공유되지 않습니다.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use edge_core::{Job, JobId, JobKind, JobOutcome, JobStatus, Ticker};

/// 추적 중인 작업 한 건.
#[derive(Debug, Clone, Serialize)]
pub struct JobEntry {
    pub id: JobId,
    pub kind: JobKind,
    pub ticker: Ticker,
    pub status: JobStatus,
    pub enqueued_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 상태별 작업 수.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryCounts {
    pub queued: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

/// 작업 상태 레지스트리.
#[derive(Default)]
pub struct JobRegistry {
    entries: RwLock<HashMap<JobId, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 큐에 들어간 작업을 등록합니다.
    pub async fn queued(&self, job: &Job) {
        let entry = JobEntry {
            id: job.id.clone(),
            kind: job.kind,
            ticker: job.ticker().clone(),
            status: JobStatus::Queued,
            enqueued_at: job.enqueued_at,
            updated_at: Utc::now(),
        };
        self.entries.write().await.insert(job.id.clone(), entry);
    }

    /// 실행 시작. 다른 프로세스가 넣은 작업이면 이 시점에 등록됩니다.
    pub async fn running(&self, job: &Job) {
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        entries
            .entry(job.id.clone())
            .and_modify(|entry| {
                entry.status = JobStatus::Running;
                entry.updated_at = now;
            })
            .or_insert_with(|| JobEntry {
                id: job.id.clone(),
                kind: job.kind,
                ticker: job.ticker().clone(),
                status: JobStatus::Running,
                enqueued_at: job.enqueued_at,
                updated_at: now,
            });
    }

    pub async fn completed(&self, id: &JobId, outcome: JobOutcome) {
        self.transition(id, JobStatus::Completed { outcome }).await;
    }

    pub async fn failed(&self, id: &JobId, reason: impl Into<String>) {
        self.transition(id, JobStatus::Failed { reason: reason.into() })
            .await;
    }

    async fn transition(&self, id: &JobId, status: JobStatus) {
        let mut entries = self.entries.write().await;
        match entries.get_mut(id) {
            // 종료 상태는 다시 바뀌지 않음
            Some(entry) if !entry.status.is_terminal() => {
                entry.status = status;
                entry.updated_at = Utc::now();
            }
            Some(_) => debug!(job_id = %id, "Ignoring transition of finished job"),
            None => debug!(job_id = %id, "Transition for unknown job"),
        }
    }

    pub async fn get(&self, id: &JobId) -> Option<JobEntry> {
        self.entries.read().await.get(id).cloned()
    }

    pub async fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.get(id).await.map(|entry| entry.status)
    }

    pub async fn counts(&self) -> RegistryCounts {
        let entries = self.entries.read().await;
        let mut counts = RegistryCounts::default();
        for entry in entries.values() {
            match entry.status {
                JobStatus::Queued => counts.queued += 1,
                JobStatus::Running => counts.running += 1,
                JobStatus::Completed { .. } => counts.completed += 1,
                JobStatus::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }

    /// `max_age`보다 오래된 종료 작업을 제거합니다. 제거한 수를 반환합니다.
    pub async fn prune(&self, max_age: ChronoDuration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !(entry.status.is_terminal() && entry.updated_at < cutoff));
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_core::JobPayload;

    fn job() -> Job {
        Job::user(JobPayload::new(Ticker::parse("AAPL").unwrap(), None))
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let registry = JobRegistry::new();
        let job = job();

        registry.queued(&job).await;
        assert_eq!(registry.status(&job.id).await, Some(JobStatus::Queued));

        registry.running(&job).await;
        assert_eq!(registry.status(&job.id).await, Some(JobStatus::Running));

        registry.completed(&job.id, JobOutcome::Fresh).await;
        assert_eq!(
            registry.status(&job.id).await,
            Some(JobStatus::Completed {
                outcome: JobOutcome::Fresh
            })
        );
    }

    #[tokio::test]
    async fn test_terminal_state_is_final() {
        let registry = JobRegistry::new();
        let job = job();

        registry.running(&job).await;
        registry.failed(&job.id, "store down").await;
        registry.completed(&job.id, JobOutcome::Cached).await;

        assert!(matches!(
            registry.status(&job.id).await,
            Some(JobStatus::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn test_counts_and_prune() {
        let registry = JobRegistry::new();
        let done = job();
        let waiting = job();

        registry.running(&done).await;
        registry.completed(&done.id, JobOutcome::Locked).await;
        registry.queued(&waiting).await;

        let counts = registry.counts().await;
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.queued, 1);

        // 음수 기간 = 모든 종료 작업이 만료됨
        assert_eq!(registry.prune(ChronoDuration::seconds(-1)).await, 1);
        assert!(registry.get(&waiting.id).await.is_some());
    }
}
