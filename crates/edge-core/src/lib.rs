//! # Edge Core
//!
//! 티커 파이프라인 전반에서 사용하는 핵심 타입을 제공합니다:
//! - 티커 심볼 및 작업(Job) 모델
//! - CompositeRecord 및 섹션(overview, fundamental, analysis, technicals, insights)
//! - 섹션 병합용 trait (빈 값 판정, 누락 필드 채우기)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use self::config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
