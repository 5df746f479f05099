//! 알림 타입 정의.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use edge_core::{CompositeRecord, Ticker};

/// 작업 완료 이벤트 이름.
pub const JOB_COMPLETED: &str = "job-completed";

/// 알림 이벤트.
///
/// 직렬화 형태는 `{"event": "job-completed", "data": {...}}`입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum NotificationEvent {
    /// 티커 작업이 레코드를 만들어 냄
    JobCompleted(Box<CompositeRecord>),
}

impl NotificationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            NotificationEvent::JobCompleted(_) => JOB_COMPLETED,
        }
    }
}

/// 발행할 알림. 채널 이름은 티커 심볼입니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub channel: String,
    pub event: NotificationEvent,
}

impl Notification {
    /// 작업 완료 알림을 생성합니다.
    pub fn job_completed(ticker: &Ticker, record: &CompositeRecord) -> Self {
        Self {
            channel: ticker.as_str().to_string(),
            event: NotificationEvent::JobCompleted(Box::new(record.clone())),
        }
    }

    /// 와이어 페이로드(JSON 문자열).
    pub fn payload(&self) -> NotificationResult<String> {
        Ok(serde_json::to_string(&self.event)?)
    }
}

/// 알림 Result 타입.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 에러.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("알림 발행 실패: {0}")]
    SendFailed(String),

    #[error("알림 발행 시간 초과: {0:?}")]
    Timeout(Duration),

    #[error("Redis 에러: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 알림 발행기 trait.
///
/// 현재 구독 중인 소비자에게만 전달되는 best-effort 푸시입니다.
/// 전달 보장이나 재전송은 없습니다.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// 알림을 발행합니다.
    async fn publish(&self, notification: &Notification) -> NotificationResult<()>;

    /// 발행기 이름을 반환합니다.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_payload_shape() {
        let ticker = Ticker::parse("AAPL").unwrap();
        let record = CompositeRecord::empty(ticker.clone(), None, Utc::now());
        let notification = Notification::job_completed(&ticker, &record);

        assert_eq!(notification.channel, "AAPL");
        assert_eq!(notification.event.name(), "job-completed");

        let payload: serde_json::Value =
            serde_json::from_str(&notification.payload().unwrap()).unwrap();
        assert_eq!(payload["event"], "job-completed");
        assert_eq!(payload["data"]["ticker"], "AAPL");
        assert!(payload["data"].get("overview").is_some());
    }
}
