//! 소스 집계.
//!
//! 네 스크래퍼를 동시에 실행하고(fan-out) 모두 끝날 때까지 기다린 뒤(fan-in)
//! 우선순위 표로 병합합니다. 한 소스의 실패가 다른 소스를 취소하지 않습니다.

pub mod insight;
pub mod merge;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use edge_core::{Blank, CompositeRecord, Ticker};

use crate::error::AggregateError;
use crate::lock::panic_message;
use crate::scraper::{SourceResult, SourceScraper};

pub use insight::{InsightGenerator, ParserInsightGenerator};
pub use merge::{MergePriority, MERGE_PRIORITY};

/// 티커 → CompositeRecord 집계 trait.
#[async_trait]
pub trait RecordAggregator: Send + Sync {
    /// 부분 실패는 허용합니다. 사용할 수 있는 결과가 하나도 없을 때만 에러입니다.
    async fn aggregate(
        &self,
        ticker: &Ticker,
        name: Option<String>,
    ) -> Result<CompositeRecord, AggregateError>;
}

/// 스크래퍼 fan-out/fan-in 집계기.
pub struct Aggregator {
    scrapers: Vec<Arc<dyn SourceScraper>>,
    priority: MergePriority,
    insights: Option<Arc<dyn InsightGenerator>>,
}

impl Aggregator {
    pub fn new(scrapers: Vec<Arc<dyn SourceScraper>>) -> Self {
        Self {
            scrapers,
            priority: MERGE_PRIORITY,
            insights: None,
        }
    }

    /// 병합 후 인사이트 생성 단계를 추가합니다.
    pub fn with_insights(mut self, generator: Arc<dyn InsightGenerator>) -> Self {
        self.insights = Some(generator);
        self
    }

    pub fn with_priority(mut self, priority: MergePriority) -> Self {
        self.priority = priority;
        self
    }

    /// 모든 스크래퍼를 동시에 실행합니다. 스크래퍼 패닉은 실패 결과로 바꿉니다.
    async fn scrape_all(&self, ticker: &Ticker) -> Vec<SourceResult> {
        let tasks = self.scrapers.iter().map(|scraper| {
            let source = scraper.kind();
            AssertUnwindSafe(scraper.scrape(ticker))
                .catch_unwind()
                .map(move |outcome| {
                    outcome.unwrap_or_else(|panic| SourceResult::Failed {
                        source,
                        reason: format!("panicked: {}", panic_message(panic.as_ref())),
                    })
                })
                .boxed()
        });

        join_all(tasks).await
    }
}

#[async_trait]
impl RecordAggregator for Aggregator {
    #[instrument(skip(self, ticker, name), fields(ticker = %ticker))]
    async fn aggregate(
        &self,
        ticker: &Ticker,
        name: Option<String>,
    ) -> Result<CompositeRecord, AggregateError> {
        let results = self.scrape_all(ticker).await;

        let failures: Vec<String> = results
            .iter()
            .filter_map(|r| match r {
                SourceResult::Failed { source, reason } => Some(format!("{}: {}", source, reason)),
                SourceResult::Success { .. } => None,
            })
            .collect();
        let succeeded = results.len() - failures.len();

        if succeeded == 0 {
            warn!(failed = failures.len(), "No source produced data");
            return Err(AggregateError::NoUsableData {
                ticker: ticker.to_string(),
                failures,
            });
        }

        let mut record = self.priority.merge(ticker, name, &results, Utc::now());

        // 성공했어도 모든 섹션이 비어 있으면 쓸 데이터가 없는 것과 같음
        if is_empty_record(&record) {
            warn!(
                succeeded,
                failed = failures.len(),
                "Sources succeeded but every section is empty"
            );
            let mut failures = failures;
            failures.push(format!("{} source(s) returned only empty sections", succeeded));
            return Err(AggregateError::NoUsableData {
                ticker: ticker.to_string(),
                failures,
            });
        }

        if let Some(generator) = &self.insights {
            match generator.generate(&record).await {
                Ok(insights) => record.insights = Some(insights),
                Err(e) => warn!(error = %e, "Insight generation failed, leaving empty"),
            }
        }

        info!(
            succeeded,
            failed = failures.len(),
            insights = record.insights.is_some(),
            "Aggregation complete"
        );
        Ok(record)
    }
}

fn is_empty_record(record: &CompositeRecord) -> bool {
    record.overview.is_blank()
        && record.fundamental.is_blank()
        && record.analysis.is_blank()
        && record.technicals.is_blank()
}
