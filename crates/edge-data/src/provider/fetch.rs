//! 원격 페이지 요청 클라이언트.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument};

use edge_core::FetchConfig;

use super::session::PageSession;
use crate::error::FetchError;
use crate::retry::RetryPolicy;

/// URL에서 본문 텍스트를 가져오는 trait.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// 재시도가 포함된 HTTP 페이지 클라이언트.
///
/// 페이지 이동과 본문 추출은 각각 별도 재시도 루프를 가집니다. 추출 마지막 시도 전에는
/// 페이지를 다시 불러옵니다.
pub struct RemoteFetchClient {
    client: Client,
    navigation: RetryPolicy,
    extraction: RetryPolicy,
}

impl RemoteFetchClient {
    pub fn new(client: Client, navigation: RetryPolicy, extraction: RetryPolicy) -> Self {
        Self {
            client,
            navigation,
            extraction,
        }
    }

    /// 설정에서 생성합니다.
    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self::new(
            client,
            RetryPolicy::from_millis(config.navigation_attempts, config.navigation_delay_ms),
            RetryPolicy::from_millis(config.extraction_attempts, config.extraction_delay_ms),
        ))
    }

    async fn fetch_in(&self, session: &PageSession) -> Result<String, FetchError> {
        self.navigation
            .run("navigate", |_| session.navigate())
            .await?;

        let last_attempt = self.extraction.max_attempts;
        self.extraction
            .run("extract", |attempt| async move {
                // 중간 재시도는 같은 문서를 다시 읽을 뿐이고, 마지막 시도 전에만 새로 불러옴
                if attempt > 1 && attempt == last_attempt {
                    session.reload().await?;
                }
                session.extract_text()
            })
            .await
    }
}

#[async_trait]
impl ContentFetcher for RemoteFetchClient {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let session = PageSession::open(self.client.clone(), url);
        let result = self.fetch_in(&session).await;
        session.close();

        if let Ok(text) = &result {
            info!(chars = text.len(), loads = session.loads(), "Fetched page text");
        }
        result
    }
}
