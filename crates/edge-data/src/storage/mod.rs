//! 키-값 저장소.
//!
//! 캐시와 분산 잠금이 공유하는 원자적 프리미티브(TTL 키, set-if-absent,
//! compare-and-delete)만 노출합니다. 만료는 저장소가 직접 처리합니다.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// 키-값 저장소 trait.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 값을 가져옵니다. 만료되었거나 없으면 `None`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// TTL과 함께 값을 저장합니다 (원자적 교체).
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// 키가 없을 때만 TTL과 함께 저장합니다. 저장했으면 `true`.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// 현재 값이 `expected`와 같을 때만 삭제합니다. 삭제했으면 `true`.
    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool>;

    /// 키를 삭제합니다. 삭제했으면 `true`.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// 저장소 상태를 확인합니다.
    async fn ping(&self) -> Result<bool>;
}

/// TTL을 초 단위로 변환합니다. Redis `EX`는 0을 허용하지 않으므로 최소 1초입니다.
pub(crate) fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
