//! 작업 큐.
//!
//! 작업 하나는 정확히 한 워커가 꺼냅니다. 프리웜 작업은 결정적 식별자로
//! 하루 한 번만 등록됩니다.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use std::time::Duration;

use edge_core::{Job, JobKind};

use crate::error::Result;

pub use self::memory::MemoryJobQueue;
pub use self::redis::RedisJobQueue;

/// 프리웜 중복 표식 유지 시간.
pub const DEDUPE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// 작업 큐 trait.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// 작업을 넣습니다. 같은 식별자의 프리웜이 이미 등록되었으면 `false`.
    async fn push(&self, job: &Job) -> Result<bool>;

    /// 작업을 꺼냅니다. `timeout` 동안 없으면 `None`.
    async fn pop(&self, timeout: Duration) -> Result<Option<Job>>;

    /// 대기 중인 작업 수.
    async fn len(&self) -> Result<usize>;
}

/// 중복 검사 대상 여부. 사용자 작업은 매번 새 식별자라 검사하지 않습니다.
pub(crate) fn needs_dedupe(job: &Job) -> bool {
    job.kind == JobKind::Prewarm
}
