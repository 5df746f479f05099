//! 병합된 레코드에 대한 인사이트 생성.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

use edge_core::{CompositeRecord, Insights};

use crate::error::ParseError;
use crate::provider::{ParseRequest, SchemaHint, TextParser};
use crate::retry::RetryPolicy;

/// 인사이트 생성기 trait.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    async fn generate(&self, record: &CompositeRecord) -> Result<Insights, ParseError>;
}

/// 텍스트 파서를 사용해 레코드 요약에서 인사이트를 만듭니다.
pub struct ParserInsightGenerator {
    parser: Arc<dyn TextParser>,
    retry: RetryPolicy,
}

impl ParserInsightGenerator {
    pub fn new(parser: Arc<dyn TextParser>, retry: RetryPolicy) -> Self {
        Self { parser, retry }
    }
}

#[async_trait]
impl InsightGenerator for ParserInsightGenerator {
    #[instrument(skip(self, record), fields(ticker = %record.ticker))]
    async fn generate(&self, record: &CompositeRecord) -> Result<Insights, ParseError> {
        let summary = serde_json::to_string(&record.summary_json())?;
        let parser = &self.parser;
        let summary = &summary;

        let section = self
            .retry
            .run("insights", |_| {
                parser.parse(ParseRequest::new(summary.as_str(), SchemaHint::Insights))
            })
            .await?;

        let insights: Insights = serde_json::from_value(section)?;
        debug!(action = ?insights.recommendation.action, "Insights generated");
        Ok(insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use edge_core::{Action, Ticker};
    use serde_json::{json, Value};
    use std::time::Duration;

    struct FixedParser(Value);

    #[async_trait]
    impl TextParser for FixedParser {
        async fn parse(&self, request: ParseRequest) -> Result<Value, ParseError> {
            assert_eq!(request.schema_hint, SchemaHint::Insights);
            assert!(request.raw_text.contains("\"ticker\":\"AAPL\""));
            Ok(self.0.clone())
        }
    }

    fn record() -> CompositeRecord {
        CompositeRecord::empty(Ticker::parse("AAPL").unwrap(), None, Utc::now())
    }

    #[tokio::test]
    async fn test_generate_decodes_insights() {
        let parser = Arc::new(FixedParser(json!({
            "summary": "Strong quarter",
            "recommendation": {"action": "Buy", "confidence": 78, "reasoning": "Growth"},
            "key_takeaways": ["Revenue up"],
            "visualization_data": {"price_trend": [], "bullishness_meter": 70, "risk_score": 30}
        })));
        let generator = ParserInsightGenerator::new(parser, RetryPolicy::once());

        let insights = generator.generate(&record()).await.unwrap();
        assert_eq!(insights.recommendation.action, Action::Buy);
        assert_eq!(insights.visualization_data.risk_score, 30.0);
    }

    #[tokio::test]
    async fn test_invalid_shape_is_error() {
        let parser = Arc::new(FixedParser(json!({"summary": 5})));
        let generator =
            ParserInsightGenerator::new(parser, RetryPolicy::new(2, Duration::from_millis(1)));

        assert!(generator.generate(&record()).await.is_err());
    }
}
