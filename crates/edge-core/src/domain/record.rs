//! CompositeRecord: 호출자에게 전달되는 최종 결과.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sections::{Analysis, Fundamental, Insights, Overview, Technicals};
use super::ticker::Ticker;

/// 레코드 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordOrigin {
    /// 원격 소스에서 수집한 데이터
    #[default]
    Live,
    /// 수집 실패 시 생성한 대체 데이터
    Synthetic,
}

/// 티커 하나에 대한 통합 레코드.
///
/// 네 섹션은 항상 존재하며(필드 단위로만 null), 인사이트는 선택입니다.
/// 직렬화 시 다섯 섹션 키가 모두 출력됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeRecord {
    pub ticker: Ticker,
    #[serde(default)]
    pub name: Option<String>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub origin: RecordOrigin,
    #[serde(default)]
    pub overview: Overview,
    #[serde(default)]
    pub fundamental: Fundamental,
    #[serde(default)]
    pub analysis: Analysis,
    #[serde(default)]
    pub technicals: Technicals,
    #[serde(default, rename = "ai_insights", alias = "insights")]
    pub insights: Option<Insights>,
}

impl CompositeRecord {
    /// 빈 섹션으로 채워진 레코드를 생성합니다.
    pub fn empty(ticker: Ticker, name: Option<String>, last_updated: DateTime<Utc>) -> Self {
        Self {
            ticker,
            name,
            last_updated,
            origin: RecordOrigin::Live,
            overview: Overview::default(),
            fundamental: Fundamental::default(),
            analysis: Analysis::default(),
            technicals: Technicals::default(),
            insights: None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.origin == RecordOrigin::Synthetic
    }

    /// 인사이트 생성 프롬프트에 넣을 요약 JSON.
    ///
    /// 목록과 과거 이력은 제외하고 핵심 지표만 남깁니다.
    pub fn summary_json(&self) -> serde_json::Value {
        serde_json::json!({
            "ticker": self.ticker,
            "name": self.name,
            "overview": self.overview,
            "valuation": self.fundamental.valuation_measures.current,
            "trading_information": self.fundamental.trading_information,
            "analyst_ratings": {
                "current_rating": self.analysis.analyst_ratings.current_rating,
                "price_target_avg": self.analysis.analyst_ratings.price_target_avg,
                "number_of_analysts": self.analysis.analyst_ratings.number_of_analysts,
            },
            "technical_summary": self.technicals.summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CompositeRecord {
        CompositeRecord::empty(
            Ticker::parse("AAPL").unwrap(),
            Some("Apple Inc.".to_string()),
            Utc::now(),
        )
    }

    #[test]
    fn test_all_section_keys_serialized() {
        let json = serde_json::to_value(record()).unwrap();
        for key in ["overview", "fundamental", "analysis", "technicals", "ai_insights"] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(json["origin"], "live");
        assert!(json["ai_insights"].is_null());
    }

    #[test]
    fn test_roundtrip_from_cache_payload() {
        let original = record();
        let payload = serde_json::to_string(&original).unwrap();
        let restored: CompositeRecord = serde_json::from_str(&payload).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_missing_sections_read_as_empty() {
        let restored: CompositeRecord = serde_json::from_str(
            r#"{"ticker":"AAPL","last_updated":"2026-01-02T03:04:05Z","insights":null}"#,
        )
        .unwrap();
        assert_eq!(restored.overview, Overview::default());
        assert!(restored.insights.is_none());
    }
}
