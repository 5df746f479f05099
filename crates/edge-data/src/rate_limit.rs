//! 소스별 요청 간격 제한.
//!
//! 소스마다 마지막 허가 시각을 `tokio::sync::Mutex`로 보호합니다. tokio Mutex는 대기자를
//! 도착 순서대로 깨우므로 허가도 FIFO로 나가고 기아가 없습니다.
//! 큐는 프로세스 로컬입니다. 여러 프로세스가 같은 소스를 호출하면 각자 간격을 지킵니다.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

use edge_core::RateLimitConfig;

type Slot = Arc<tokio::sync::Mutex<Option<Instant>>>;

/// 소스별 최소 간격 제한기.
#[derive(Debug, Default)]
pub struct RateLimiter {
    default_interval: Duration,
    overrides: HashMap<String, Duration>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl RateLimiter {
    /// 모든 소스에 같은 최소 간격을 적용합니다.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            default_interval: min_interval,
            overrides: HashMap::new(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// 설정에서 생성합니다.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        let mut limiter = Self::new(Duration::from_millis(config.min_interval_ms));
        for source in config.per_source_ms.keys() {
            limiter
                .overrides
                .insert(source.clone(), config.interval_for(source));
        }
        limiter
    }

    /// 특정 소스의 간격을 재정의합니다.
    pub fn with_interval(mut self, source: impl Into<String>, interval: Duration) -> Self {
        self.overrides.insert(source.into(), interval);
        self
    }

    pub fn interval_for(&self, source: &str) -> Duration {
        self.overrides
            .get(source)
            .copied()
            .unwrap_or(self.default_interval)
    }

    fn slot(&self, source: &str) -> Slot {
        // 락이 오염되어도 맵 자체는 유효하므로 내부 값을 그대로 사용
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .entry(source.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(None)))
            .clone()
    }

    /// 소스의 마지막 허가 이후 최소 간격이 지날 때까지 대기합니다.
    ///
    /// 실패하지 않으며 호출자만 대기합니다.
    pub async fn wait_for_turn(&self, source: &str) {
        let interval = self.interval_for(source);
        let slot = self.slot(source);

        let mut last_granted = slot.lock().await;
        if let Some(last) = *last_granted {
            let ready_at = last + interval;
            if ready_at > Instant::now() {
                trace!(source, wait_ms = (ready_at - Instant::now()).as_millis() as u64, "Rate limited");
                sleep_until(ready_at).await;
            }
        }
        *last_granted = Some(Instant::now());
    }
}
