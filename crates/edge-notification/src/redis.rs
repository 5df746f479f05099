//! Redis pub/sub 발행기.
//!
//! 채널 = 티커 심볼. 구독자가 없으면 메시지는 버려집니다.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::debug;

use crate::types::{Notification, NotificationPublisher, NotificationResult};

/// Redis PUBLISH 기반 발행기.
#[derive(Clone)]
pub struct RedisPublisher {
    connection: MultiplexedConnection,
}

impl RedisPublisher {
    /// 공유 연결로 생성합니다.
    pub fn new(connection: MultiplexedConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl NotificationPublisher for RedisPublisher {
    async fn publish(&self, notification: &Notification) -> NotificationResult<()> {
        let payload = notification.payload()?;
        let mut conn = self.connection.clone();

        let receivers: u64 = conn.publish(&notification.channel, payload).await?;
        debug!(
            channel = %notification.channel,
            event = notification.event.name(),
            receivers,
            "Published to Redis"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use edge_core::{CompositeRecord, Ticker};
    use futures::StreamExt;

    // 실제 Redis 서버가 필요한 테스트
    #[tokio::test]
    #[ignore]
    async fn test_subscriber_receives_payload() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());
        let client = redis::Client::open(url).unwrap();

        let mut pubsub = client.get_async_pubsub().await.unwrap();
        pubsub.subscribe("EDGETEST").await.unwrap();

        let publisher = RedisPublisher::new(client.get_multiplexed_async_connection().await.unwrap());
        let ticker = Ticker::parse("EDGETEST").unwrap();
        let record = CompositeRecord::empty(ticker.clone(), None, Utc::now());
        publisher
            .publish(&Notification::job_completed(&ticker, &record))
            .await
            .unwrap();

        let message = pubsub.on_message().next().await.unwrap();
        let payload: String = message.get_payload().unwrap();
        assert!(payload.contains("\"event\":\"job-completed\""));
    }
}
