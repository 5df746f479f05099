//! 고정 간격 재시도 유틸리티.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// 최대 시도 횟수와 고정 대기 시간으로 재시도합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 최대 시도 횟수 (최소 1)
    pub max_attempts: u32,
    /// 시도 사이 대기 시간
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// 밀리초 단위 설정값에서 생성합니다.
    pub fn from_millis(max_attempts: u32, delay_ms: u64) -> Self {
        Self::new(max_attempts, Duration::from_millis(delay_ms))
    }

    /// 재시도 없이 한 번만 실행합니다.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// `f`가 성공하거나 시도 횟수를 다 쓸 때까지 실행합니다.
    ///
    /// `f`는 1부터 시작하는 시도 번호를 받습니다. 모두 실패하면 마지막 에러를 반환합니다.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match f(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if attempt < self.max_attempts => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(operation, attempt, error = %e, "All attempts failed");
                    return Err(e);
                }
            }
        }
    }
}
