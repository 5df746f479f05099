//! 소스 스크래퍼.
//!
//! 각 스크래퍼는 한 데이터 범주를 담당합니다: rate limit 대기 → 페이지 요청 → 파서 → 부분 레코드.
//! 실패는 `SourceResult::Failed`로 돌려주고 밖으로 전파하지 않습니다.

pub mod decode;
pub mod page;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use edge_core::{Analysis, Fundamental, Overview, SourcesConfig, Technicals, Ticker};

use crate::provider::SchemaHint;

pub use page::PageScraper;

/// 데이터 소스 범주.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Overview,
    Fundamental,
    Analysis,
    Technicals,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Overview,
        SourceKind::Fundamental,
        SourceKind::Analysis,
        SourceKind::Technicals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Overview => "overview",
            SourceKind::Fundamental => "fundamental",
            SourceKind::Analysis => "analysis",
            SourceKind::Technicals => "technicals",
        }
    }

    /// Rate limit 키 (호스트 단위). Yahoo 세 범주는 한 큐를 공유합니다.
    pub fn rate_key(&self) -> &'static str {
        match self {
            SourceKind::Technicals => "tradingview",
            _ => "yahoo",
        }
    }

    pub fn schema_hint(&self) -> SchemaHint {
        match self {
            SourceKind::Overview => SchemaHint::Overview,
            SourceKind::Fundamental => SchemaHint::Fundamental,
            SourceKind::Analysis => SchemaHint::Analysis,
            SourceKind::Technicals => SchemaHint::Technicals,
        }
    }

    pub fn url_template<'a>(&self, sources: &'a SourcesConfig) -> &'a str {
        match self {
            SourceKind::Overview => &sources.overview_url,
            SourceKind::Fundamental => &sources.fundamental_url,
            SourceKind::Analysis => &sources.analysis_url,
            SourceKind::Technicals => &sources.technicals_url,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// URL 템플릿의 `{ticker}`를 심볼로 치환합니다.
pub fn render_url(template: &str, ticker: &Ticker) -> String {
    template.replace("{ticker}", ticker.as_str())
}

/// 한 소스가 기여하는 섹션들.
///
/// 주 섹션 외에 다른 섹션의 일부 필드를 보조로 채울 수 있습니다
/// (예: key statistics 페이지의 beta → overview.beta).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRecord {
    pub overview: Option<Overview>,
    pub fundamental: Option<Fundamental>,
    pub analysis: Option<Analysis>,
    pub technicals: Option<Technicals>,
}

/// 스크래퍼 한 번의 결과.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceResult {
    Success {
        source: SourceKind,
        record: PartialRecord,
    },
    Failed {
        source: SourceKind,
        reason: String,
    },
}

impl SourceResult {
    pub fn source(&self) -> SourceKind {
        match self {
            SourceResult::Success { source, .. } | SourceResult::Failed { source, .. } => *source,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SourceResult::Success { .. })
    }

    pub fn record(&self) -> Option<&PartialRecord> {
        match self {
            SourceResult::Success { record, .. } => Some(record),
            SourceResult::Failed { .. } => None,
        }
    }
}

/// 소스 스크래퍼 trait. 호출 사이에 상태를 갖지 않습니다.
#[async_trait]
pub trait SourceScraper: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn scrape(&self, ticker: &Ticker) -> SourceResult;
}
