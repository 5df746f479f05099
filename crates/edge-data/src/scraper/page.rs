//! 페이지 기반 스크래퍼.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use edge_core::{AppConfig, Ticker};

use super::decode::decode;
use super::{render_url, SourceKind, SourceResult, SourceScraper};
use crate::provider::{ContentFetcher, ParseRequest, TextParser};
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;

/// rate limiter + fetch client + 파서를 조합한 스크래퍼.
pub struct PageScraper {
    kind: SourceKind,
    url_template: String,
    rate_limiter: Arc<RateLimiter>,
    fetcher: Arc<dyn ContentFetcher>,
    parser: Arc<dyn TextParser>,
    parse_retry: RetryPolicy,
}

impl PageScraper {
    pub fn new(
        kind: SourceKind,
        url_template: impl Into<String>,
        rate_limiter: Arc<RateLimiter>,
        fetcher: Arc<dyn ContentFetcher>,
        parser: Arc<dyn TextParser>,
        parse_retry: RetryPolicy,
    ) -> Self {
        Self {
            kind,
            url_template: url_template.into(),
            rate_limiter,
            fetcher,
            parser,
            parse_retry,
        }
    }

    /// 네 범주의 스크래퍼를 모두 생성합니다. 같은 rate limiter를 공유합니다.
    pub fn all(
        config: &AppConfig,
        rate_limiter: Arc<RateLimiter>,
        fetcher: Arc<dyn ContentFetcher>,
        parser: Arc<dyn TextParser>,
    ) -> Vec<Arc<dyn SourceScraper>> {
        let parse_retry =
            RetryPolicy::from_millis(config.parser.attempts, config.parser.retry_delay_ms);

        SourceKind::ALL
            .iter()
            .map(|kind| {
                Arc::new(PageScraper::new(
                    *kind,
                    kind.url_template(&config.sources),
                    rate_limiter.clone(),
                    fetcher.clone(),
                    parser.clone(),
                    parse_retry,
                )) as Arc<dyn SourceScraper>
            })
            .collect()
    }

    fn failed(&self, reason: String) -> SourceResult {
        warn!(source = %self.kind, reason = %reason, "Source failed");
        SourceResult::Failed {
            source: self.kind,
            reason,
        }
    }
}

#[async_trait]
impl SourceScraper for PageScraper {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    #[instrument(skip(self, ticker), fields(source = %self.kind, ticker = %ticker))]
    async fn scrape(&self, ticker: &Ticker) -> SourceResult {
        let url = render_url(&self.url_template, ticker);

        self.rate_limiter.wait_for_turn(self.kind.rate_key()).await;

        let text = match self.fetcher.fetch(&url).await {
            Ok(text) => text,
            Err(e) => return self.failed(format!("fetch: {}", e)),
        };

        let hint = self.kind.schema_hint();
        let parser = &self.parser;
        let text = &text;
        let section = match self
            .parse_retry
            .run("parse", |_| parser.parse(ParseRequest::new(text.as_str(), hint)))
            .await
        {
            Ok(section) => section,
            Err(e) => return self.failed(format!("parse: {}", e)),
        };

        match decode(self.kind, section) {
            Ok(record) => {
                info!("Source scraped");
                SourceResult::Success {
                    source: self.kind,
                    record,
                }
            }
            Err(e) => self.failed(format!("decode: {}", e)),
        }
    }
}
