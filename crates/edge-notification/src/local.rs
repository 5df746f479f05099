//! 프로세스 내부 발행기.
//!
//! - `BroadcastPublisher`: 단일 프로세스 모드에서 같은 프로세스의 구독자에게 전달
//! - `RecordingPublisher`: 발행 내역을 기록 (테스트용)

use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::types::{Notification, NotificationError, NotificationPublisher, NotificationResult};

/// tokio broadcast 채널 기반 발행기.
#[derive(Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastPublisher {
    /// 버퍼 크기를 지정해 생성합니다. 느린 구독자는 오래된 알림을 놓칩니다.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// 새 구독자를 만듭니다. 구독 이후 발행된 알림만 받습니다.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl NotificationPublisher for BroadcastPublisher {
    async fn publish(&self, notification: &Notification) -> NotificationResult<()> {
        // 구독자가 없으면 send가 실패하지만 best-effort이므로 정상 처리
        match self.sender.send(notification.clone()) {
            Ok(receivers) => debug!(channel = %notification.channel, receivers, "Broadcast sent"),
            Err(_) => debug!(channel = %notification.channel, "No local subscribers"),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "broadcast"
    }
}

/// 발행 내역을 기록하는 발행기.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 항상 실패하는 발행기. 시도 내역은 기록합니다.
    pub fn failing() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// 지금까지 발행된 알림.
    pub fn published(&self) -> Vec<Notification> {
        self.published
            .lock()
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    /// 특정 채널에 발행된 횟수.
    pub fn count_for(&self, channel: &str) -> usize {
        self.published()
            .iter()
            .filter(|n| n.channel == channel)
            .count()
    }
}

#[async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn publish(&self, notification: &Notification) -> NotificationResult<()> {
        self.published
            .lock()
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?
            .push(notification.clone());

        if self.fail {
            return Err(NotificationError::SendFailed("injected failure".to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NotificationEvent;
    use chrono::Utc;
    use edge_core::{CompositeRecord, Ticker};

    fn notification(symbol: &str) -> Notification {
        let ticker = Ticker::parse(symbol).unwrap();
        let record = CompositeRecord::empty(ticker.clone(), None, Utc::now());
        Notification::job_completed(&ticker, &record)
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscriber() {
        let publisher = BroadcastPublisher::default();
        let mut rx = publisher.subscribe();

        publisher.publish(&notification("AAPL")).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.channel, "AAPL");
        assert!(matches!(received.event, NotificationEvent::JobCompleted(_)));
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_ok() {
        let publisher = BroadcastPublisher::new(4);
        assert!(publisher.publish(&notification("AAPL")).await.is_ok());
    }

    #[tokio::test]
    async fn test_recording_counts_per_channel() {
        let publisher = RecordingPublisher::new();
        publisher.publish(&notification("AAPL")).await.unwrap();
        publisher.publish(&notification("MSFT")).await.unwrap();
        publisher.publish(&notification("AAPL")).await.unwrap();

        assert_eq!(publisher.count_for("AAPL"), 2);
        assert_eq!(publisher.published().len(), 3);
    }
}
