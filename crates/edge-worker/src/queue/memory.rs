//! 인메모리 작업 큐 (단일 프로세스 모드, 테스트).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::time::Instant;
use tracing::debug;

use edge_core::Job;

use super::{needs_dedupe, JobQueue, DEDUPE_TTL};
use crate::error::{Result, WorkerError};

/// mpsc 채널 기반 큐.
pub struct MemoryJobQueue {
    sender: mpsc::UnboundedSender<Job>,
    receiver: AsyncMutex<mpsc::UnboundedReceiver<Job>>,
    seen: Mutex<HashMap<String, Instant>>,
    pending: AtomicUsize,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: AsyncMutex::new(receiver),
            seen: Mutex::new(HashMap::new()),
            pending: AtomicUsize::new(0),
        }
    }

    /// 표식을 기록합니다. 유효한 표식이 이미 있으면 `false`.
    fn mark(&self, id: &str) -> Result<bool> {
        let mut seen = self
            .seen
            .lock()
            .map_err(|e| WorkerError::Queue(e.to_string()))?;
        let now = Instant::now();
        seen.retain(|_, expires_at| *expires_at > now);

        if seen.contains_key(id) {
            return Ok(false);
        }
        seen.insert(id.to_string(), now + DEDUPE_TTL);
        Ok(true)
    }
}

impl Default for MemoryJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn push(&self, job: &Job) -> Result<bool> {
        if needs_dedupe(job) && !self.mark(job.id.as_str())? {
            debug!(job_id = %job.id, "Duplicate prewarm job ignored");
            return Ok(false);
        }

        self.sender
            .send(job.clone())
            .map_err(|_| WorkerError::Queue("queue closed".to_string()))?;
        self.pending.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<Job>> {
        let mut receiver = self.receiver.lock().await;

        match tokio::time::timeout(timeout, receiver.recv()).await {
            Ok(Some(job)) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                Ok(Some(job))
            }
            Ok(None) => Err(WorkerError::Queue("queue closed".to_string())),
            Err(_) => Ok(None),
        }
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.pending.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use edge_core::{JobPayload, Ticker};

    fn payload(symbol: &str) -> JobPayload {
        JobPayload::new(Ticker::parse(symbol).unwrap(), None)
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = MemoryJobQueue::new();
        let first = Job::user(payload("AAPL"));
        let second = Job::user(payload("MSFT"));

        queue.push(&first).await.unwrap();
        queue.push(&second).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 2);

        let timeout = Duration::from_millis(10);
        assert_eq!(queue.pop(timeout).await.unwrap().unwrap().id, first.id);
        assert_eq!(queue.pop(timeout).await.unwrap().unwrap().id, second.id);
        assert_eq!(queue.len().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pop_times_out_when_empty() {
        let queue = MemoryJobQueue::new();
        assert!(queue.pop(Duration::from_secs(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_prewarm_deduplicated_per_day() {
        let queue = MemoryJobQueue::new();
        let now = Utc::now();

        assert!(queue.push(&Job::prewarm(payload("NVDA"), now)).await.unwrap());
        assert!(!queue.push(&Job::prewarm(payload("NVDA"), now)).await.unwrap());
        assert_eq!(queue.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_user_jobs_never_deduplicated() {
        let queue = MemoryJobQueue::new();

        assert!(queue.push(&Job::user(payload("AAPL"))).await.unwrap());
        assert!(queue.push(&Job::user(payload("AAPL"))).await.unwrap());
        assert_eq!(queue.len().await.unwrap(), 2);
    }
}
