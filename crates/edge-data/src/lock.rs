//! 티커별 분산 잠금.
//!
//! 키는 `lock:{SYMBOL}`, 값은 획득 시 생성한 UUID 토큰입니다.
//! 획득은 SET NX EX, 해제는 토큰 비교 후 삭제라서 TTL 만료 후 다른 워커가
//! 다시 잡은 잠금을 지우지 않습니다.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use edge_core::Ticker;

use crate::error::{DataError, Result};
use crate::storage::KeyValueStore;

/// 획득한 잠금.
///
/// `DistributedLock::release`가 값을 소비하므로 두 번 해제할 수 없습니다.
#[derive(Debug)]
#[must_use = "a held lock must be released"]
pub struct LockGuard {
    key: String,
    token: String,
}

impl LockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// 분산 잠금.
#[derive(Clone)]
pub struct DistributedLock {
    store: Arc<dyn KeyValueStore>,
}

impl DistributedLock {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// 잠금 획득을 시도합니다. 다른 보유자가 있으면 즉시 `None`을 반환합니다 (대기 없음).
    #[instrument(skip(self, ticker), fields(ticker = %ticker))]
    pub async fn try_acquire(&self, ticker: &Ticker, ttl: Duration) -> Result<Option<LockGuard>> {
        let key = ticker.lock_key();
        let token = Uuid::new_v4().to_string();

        if self.store.set_nx_ex(&key, &token, ttl).await? {
            debug!(ttl_secs = ttl.as_secs(), "Lock acquired");
            Ok(Some(LockGuard { key, token }))
        } else {
            debug!("Lock busy");
            Ok(None)
        }
    }

    /// 잠금을 해제합니다.
    ///
    /// 이미 만료되어 다른 보유자가 잡은 경우 삭제하지 않고 `false`를 반환합니다.
    #[instrument(skip(self, guard), fields(key = %guard.key))]
    pub async fn release(&self, guard: LockGuard) -> Result<bool> {
        let released = self.store.delete_if_equals(&guard.key, &guard.token).await?;
        if released {
            debug!("Lock released");
        } else {
            warn!("Lock expired before release");
        }
        Ok(released)
    }

    /// 잠금을 잡은 상태로 `critical_section`을 실행합니다.
    ///
    /// 잠금이 바쁘면 `Ok(None)`. 임계 구역이 에러를 반환하거나 패닉해도 잠금은 해제됩니다.
    /// 패닉은 `DataError::CriticalSection`으로 변환됩니다.
    pub async fn with_lock<T, F, Fut>(
        &self,
        ticker: &Ticker,
        ttl: Duration,
        critical_section: F,
    ) -> Result<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let Some(guard) = self.try_acquire(ticker, ttl).await? else {
            return Ok(None);
        };
        let key = guard.key().to_string();

        let outcome = AssertUnwindSafe(critical_section()).catch_unwind().await;

        // 임계 구역 결과와 무관하게 해제
        let released = self.release(guard).await;

        let value = match outcome {
            Ok(result) => result?,
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(key = %key, reason = %reason, "Critical section panicked");
                released?;
                return Err(DataError::CriticalSection { key, reason });
            }
        };

        released?;
        Ok(Some(value))
    }
}

/// 패닉 페이로드에서 메시지를 꺼냅니다.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
