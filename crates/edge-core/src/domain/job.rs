//! 작업(Job) 모델.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ticker::Ticker;
use crate::error::CoreError;

/// 작업 식별자.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// 사용자 작업용 임의 식별자.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// 프리웜 작업용 결정적 식별자 (`prewarm:{TICKER}:{YYYY-MM-DD}`).
    ///
    /// 같은 날 같은 티커의 프리웜은 같은 식별자를 가지므로 중복 등록을 걸러낼 수 있습니다.
    pub fn prewarm(ticker: &Ticker, date: NaiveDate) -> Self {
        Self(format!("prewarm:{}:{}", ticker, date.format("%Y-%m-%d")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// 작업 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// 사용자 요청. 완료 시 구독자에게 알립니다.
    User,
    /// 캐시 예열. 알림을 보내지 않습니다.
    Prewarm,
}

impl JobKind {
    pub fn notifies(&self) -> bool {
        matches!(self, JobKind::User)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::User => write!(f, "user"),
            JobKind::Prewarm => write!(f, "prewarm"),
        }
    }
}

impl FromStr for JobKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "prewarm" => Ok(Self::Prewarm),
            _ => Err(CoreError::InvalidJobKind(s.to_string())),
        }
    }
}

/// 작업 페이로드. 두 종류 모두 같은 형태입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPayload {
    pub ticker: Ticker,
    #[serde(default)]
    pub name: Option<String>,
}

impl JobPayload {
    pub fn new(ticker: Ticker, name: Option<String>) -> Self {
        let name = name.filter(|n| !n.trim().is_empty());
        Self { ticker, name }
    }
}

/// 큐에 들어가는 작업.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub payload: JobPayload,
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    /// 사용자 작업을 생성합니다.
    pub fn user(payload: JobPayload) -> Self {
        Self {
            id: JobId::random(),
            kind: JobKind::User,
            payload,
            enqueued_at: Utc::now(),
        }
    }

    /// 프리웜 작업을 생성합니다.
    pub fn prewarm(payload: JobPayload, now: DateTime<Utc>) -> Self {
        Self {
            id: JobId::prewarm(&payload.ticker, now.date_naive()),
            kind: JobKind::Prewarm,
            payload,
            enqueued_at: now,
        }
    }

    pub fn ticker(&self) -> &Ticker {
        &self.payload.ticker
    }
}

/// 작업 완료 결과 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobOutcome {
    /// 원격 소스에서 새로 수집
    Fresh,
    /// 수집 실패로 대체 데이터 생성
    Synthetic,
    /// 캐시에서 반환
    Cached,
    /// 다른 워커가 처리 중이라 건너뜀
    Locked,
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobOutcome::Fresh => "fresh",
            JobOutcome::Synthetic => "synthetic",
            JobOutcome::Cached => "cached",
            JobOutcome::Locked => "locked",
        };
        f.write_str(s)
    }
}

/// 작업 상태: `queued → running → {completed, failed}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed { outcome: JobOutcome },
    Failed { reason: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Failed { .. })
    }
}
