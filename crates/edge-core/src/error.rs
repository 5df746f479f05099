//! 핵심 에러 타입.

use thiserror::Error;

/// 도메인 및 설정 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 잘못된 티커 심볼
    #[error("잘못된 티커: {0}")]
    InvalidTicker(String),

    /// 알 수 없는 작업 종류
    #[error("알 수 없는 작업 종류: {0}")]
    InvalidJobKind(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(#[from] config::ConfigError),

    /// 로깅 초기화 실패 (잘못된 필터, 중복 초기화)
    #[error("로깅 초기화 실패: {0}")]
    Logging(String),
}

/// 핵심 작업용 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
