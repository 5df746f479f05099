//! Best-effort 알림 디스패처.
//!
//! 등록된 발행기 전체에 알림을 보내고, 실패나 시간 초과는 로그만 남깁니다.
//! 호출자는 결과를 받지 않으므로 알림 실패가 작업 결과에 영향을 주지 않습니다.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use edge_core::{CompositeRecord, NotificationConfig, Ticker};

use crate::types::{Notification, NotificationError, NotificationPublisher};

/// 알림 디스패처.
#[derive(Clone)]
pub struct Notifier {
    publishers: Vec<Arc<dyn NotificationPublisher>>,
    timeout: Duration,
    enabled: bool,
}

impl Notifier {
    pub fn new(timeout: Duration) -> Self {
        Self {
            publishers: Vec::new(),
            timeout,
            enabled: true,
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            publishers: Vec::new(),
            timeout: config.timeout(),
            enabled: config.enabled,
        }
    }

    /// 발행기를 추가합니다.
    pub fn with_publisher(mut self, publisher: Arc<dyn NotificationPublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    /// 발행기가 하나도 없거나 비활성화된 상태.
    pub fn is_noop(&self) -> bool {
        !self.enabled || self.publishers.is_empty()
    }

    /// 티커 채널로 작업 완료 알림을 보냅니다. 실패는 삼킵니다.
    pub async fn job_completed(&self, ticker: &Ticker, record: &CompositeRecord) {
        if self.is_noop() {
            debug!(ticker = %ticker, "Notification disabled, skipping");
            return;
        }

        let notification = Notification::job_completed(ticker, record);
        let sends = self.publishers.iter().map(|publisher| {
            let notification = &notification;
            async move {
                let outcome = tokio::time::timeout(self.timeout, publisher.publish(notification))
                    .await
                    .unwrap_or(Err(NotificationError::Timeout(self.timeout)));

                if let Err(e) = outcome {
                    warn!(
                        publisher = publisher.name(),
                        channel = %notification.channel,
                        error = %e,
                        "Notification dropped"
                    );
                }
            }
        });

        join_all(sends).await;
    }
}
