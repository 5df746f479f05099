//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 저장소(캐시/잠금) 관련 오류.
///
/// 작업 단위에서 복구하지 않는 인프라 오류입니다.
#[derive(Debug, Error)]
pub enum DataError {
    /// 저장소 연결 오류
    #[error("Store connection error: {0}")]
    Connection(String),

    /// 저장소 명령 실패
    #[error("Store error: {0}")]
    Store(String),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 잠금 임계 구역 내부 실패
    #[error("Critical section failed for {key}: {reason}")]
    CriticalSection { key: String, reason: String },

    /// 설정 오류
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<redis::RedisError> for DataError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_io_error() {
            DataError::Connection(err.to_string())
        } else {
            DataError::Store(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

/// 원격 페이지 요청 오류.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP 요청 실패: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} 응답: {url}")]
    Status { url: String, status: u16 },

    #[error("Rate limit 초과: {url}")]
    RateLimited { url: String },

    #[error("추출된 본문이 비어 있음: {url}")]
    EmptyContent { url: String },

    #[error("페이지가 로드되지 않음")]
    NotLoaded,

    #[error("세션이 이미 닫힘")]
    SessionClosed,
}

/// 텍스트 파서(외부 협력자) 오류.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("파서 요청 실패: {0}")]
    Http(#[from] reqwest::Error),

    #[error("파서 응답 HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("파서 API 키가 설정되지 않음")]
    NotConfigured,

    #[error("파서 응답에 텍스트가 없음")]
    EmptyReply,

    #[error("응답에 ```json 블록이 없음")]
    MissingJsonBlock,

    #[error("JSON 파싱 실패: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("루트 키 없음: {0}")]
    MissingRootKey(&'static str),
}

/// 집계 오류.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// 모든 소스가 실패해 사용할 데이터가 없음
    #[error("No usable data for {ticker}: {} source(s) failed", failures.len())]
    NoUsableData {
        ticker: String,
        failures: Vec<String>,
    },
}
