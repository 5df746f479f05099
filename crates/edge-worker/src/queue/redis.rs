//! Redis 리스트 기반 작업 큐.
//!
//! `LPUSH queue:{name}` / `BRPOP queue:{name}`. 여러 워커 프로세스가 같은 큐를
//! 공유하며 BRPOP이 원자적이라 작업 하나는 한 워커만 받습니다.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use edge_core::Job;

use super::{needs_dedupe, JobQueue, DEDUPE_TTL};
use crate::error::Result;

/// Redis 작업 큐.
pub struct RedisJobQueue {
    key: String,
    connection: MultiplexedConnection,
    /// BRPOP 전용 연결. 공유 연결에서 블로킹하지 않도록 분리합니다.
    blocking: AsyncMutex<MultiplexedConnection>,
}

impl RedisJobQueue {
    /// `connection`은 일반 명령용, `blocking`은 BRPOP 전용 연결입니다.
    pub fn new(
        name: &str,
        connection: MultiplexedConnection,
        blocking: MultiplexedConnection,
    ) -> Self {
        Self {
            key: format!("queue:{}", name),
            connection,
            blocking: AsyncMutex::new(blocking),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn dedupe_key(&self, job: &Job) -> String {
        format!("{}:seen:{}", self.key, job.id)
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn push(&self, job: &Job) -> Result<bool> {
        let mut conn = self.connection.clone();

        if needs_dedupe(job) {
            let marked: Option<String> = redis::cmd("SET")
                .arg(self.dedupe_key(job))
                .arg(1)
                .arg("NX")
                .arg("EX")
                .arg(DEDUPE_TTL.as_secs())
                .query_async(&mut conn)
                .await?;

            if marked.is_none() {
                debug!(job_id = %job.id, "Duplicate prewarm job ignored");
                return Ok(false);
            }
        }

        let payload = serde_json::to_string(job)?;
        let _: i64 = conn.lpush(&self.key, payload).await?;
        Ok(true)
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<Job>> {
        let mut conn = self.blocking.lock().await;
        let secs = timeout.as_secs().max(1);

        let reply: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(&self.key)
            .arg(secs)
            .query_async(&mut *conn)
            .await?;

        let Some((_, payload)) = reply else {
            return Ok(None);
        };

        match serde_json::from_str::<Job>(&payload) {
            Ok(job) => Ok(Some(job)),
            Err(e) => {
                // 읽을 수 없는 항목은 버리고 다음 폴링으로 넘어감
                warn!(error = %e, "Discarding malformed job payload");
                Ok(None)
            }
        }
    }

    async fn len(&self) -> Result<usize> {
        let mut conn = self.connection.clone();
        let len: usize = conn.llen(&self.key).await?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use edge_core::{JobPayload, Ticker};

    async fn queue(name: &str) -> RedisJobQueue {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());
        let client = redis::Client::open(url).unwrap();
        let shared = client.get_multiplexed_async_connection().await.unwrap();
        let blocking = client.get_multiplexed_async_connection().await.unwrap();

        let mut conn = shared.clone();
        let _: () = redis::cmd("DEL")
            .arg(format!("queue:{}", name))
            .query_async(&mut conn)
            .await
            .unwrap();
        RedisJobQueue::new(name, shared, blocking)
    }

    // 실제 Redis 서버가 필요한 테스트
    #[tokio::test]
    #[ignore]
    async fn test_push_pop_round_trip() {
        let queue = queue("edge-test-roundtrip").await;
        let job = Job::user(JobPayload::new(Ticker::parse("AAPL").unwrap(), None));

        assert!(queue.push(&job).await.unwrap());
        assert_eq!(queue.len().await.unwrap(), 1);

        let popped = queue.pop(Duration::from_secs(1)).await.unwrap().unwrap();
        assert_eq!(popped, job);
    }

    #[tokio::test]
    #[ignore]
    async fn test_prewarm_dedupe_marker() {
        let queue = queue("edge-test-dedupe").await;
        let ticker = Ticker::parse(&format!("T{}", Utc::now().timestamp_millis() % 100_000)).unwrap();
        let job = Job::prewarm(JobPayload::new(ticker, None), Utc::now());

        assert!(queue.push(&job).await.unwrap());
        assert!(!queue.push(&job).await.unwrap());
    }
}
