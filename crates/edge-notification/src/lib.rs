//! # Edge Notification
//!
//! 티커 작업 완료 알림 서비스.
//!
//! 지원 채널:
//! - Redis pub/sub (채널 = 티커 심볼, 여러 프로세스의 구독자)
//! - tokio broadcast (단일 프로세스 구독자)
//!
//! 모든 발행은 best-effort입니다. 발행 시점에 구독 중인 소비자만 받으며
//! 전달 보장, 재전송, 영속 로그는 없습니다.

pub mod local;
pub mod notifier;
pub mod redis;
pub mod types;

pub use self::redis::RedisPublisher;
pub use local::{BroadcastPublisher, RecordingPublisher};
pub use notifier::Notifier;
pub use types::*;
