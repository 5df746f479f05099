//! 티커 데이터 수집 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 키-값 저장소 추상화 (Redis, 인메모리)
//! - TTL 캐시와 티커별 분산 잠금
//! - 소스별 rate limiter와 재시도 유틸리티
//! - 원격 페이지 클라이언트와 파서 클라이언트
//! - 네 개의 소스 스크래퍼, 우선순위 병합, 집계기
//! - 수집 실패 시 대체 레코드 생성기

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod fallback;
pub mod lock;
pub mod provider;
pub mod rate_limit;
pub mod retry;
pub mod scraper;
pub mod storage;

pub use error::{AggregateError, DataError, FetchError, ParseError, Result};

// 저장소 재내보내기
pub use cache::{CacheStats, CacheStore};
pub use lock::{DistributedLock, LockGuard};
pub use storage::{KeyValueStore, MemoryStore, RedisStore};

// 수집 파이프라인 재내보내기
pub use aggregate::{
    Aggregator, InsightGenerator, MergePriority, ParserInsightGenerator, RecordAggregator,
    MERGE_PRIORITY,
};
pub use fallback::FallbackGenerator;
pub use provider::{
    ContentFetcher, LlmTextParser, ParseRequest, RemoteFetchClient, SchemaHint, TextParser,
};
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
pub use scraper::{PageScraper, PartialRecord, SourceKind, SourceResult, SourceScraper};
