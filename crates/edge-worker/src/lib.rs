//! 티커 작업 워커.
//!
//! 이 crate는 다음을 제공합니다:
//! - 작업 큐 (Redis 리스트, 인메모리)와 작업 상태 레지스트리
//! - 작업 하나의 처리 흐름 (캐시 → 잠금 → 집계/대체 → 캐시 → 알림)
//! - 동시 실행 수가 제한된 워커 풀
//! - HTTP 인터페이스 (헬스 체크, 작업 등록, 캐시 확인)

pub mod dispatcher;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod pool;
pub mod queue;
pub mod registry;
pub mod services;
pub mod stats;

pub use dispatcher::{Dispatcher, Enqueued, PrewarmSummary};
pub use error::{Result, WorkerError};
pub use http::{create_router, AppState};
pub use pipeline::TickerPipeline;
pub use pool::{execute, WorkerPool};
pub use queue::{JobQueue, MemoryJobQueue, RedisJobQueue};
pub use registry::{JobEntry, JobRegistry, RegistryCounts};
pub use services::{build_aggregator, Services};
pub use stats::{WorkerStats, WorkerStatsSnapshot};
