//! 워커 에러 타입.

use thiserror::Error;

use edge_core::CoreError;
use edge_data::DataError;

/// 워커 에러.
///
/// 캐시/잠금 저장소 장애(`Data`)만 작업 실패로 이어집니다.
/// 소스 수집 실패는 스크래퍼와 대체 생성기에서 흡수됩니다.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// 캐시/잠금 저장소 에러
    #[error("저장소 에러: {0}")]
    Data(#[from] DataError),

    /// 도메인 에러 (잘못된 티커 등)
    #[error(transparent)]
    Core(#[from] CoreError),

    /// 큐 에러
    #[error("큐 에러: {0}")]
    Queue(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 서비스 초기화 실패
    #[error("초기화 실패: {0}")]
    Init(String),

    /// 작업 처리 중 패닉
    #[error("작업 패닉: {0}")]
    Panicked(String),
}

impl From<redis::RedisError> for WorkerError {
    fn from(err: redis::RedisError) -> Self {
        WorkerError::Data(DataError::from(err))
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, WorkerError>;
