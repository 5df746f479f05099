//! 요청 단위 페이지 세션.
//!
//! 요청마다 세션을 열고 모든 종료 경로에서 닫습니다. 명시적으로 `close`하지 않고
//! 버려지면 `Drop`에서 정리 후 기록합니다.

use reqwest::{Client, StatusCode};
use scraper::Html;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use tracing::{debug, trace};

use crate::error::FetchError;

/// 본문 텍스트에서 제외할 요소.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head", "svg"];

/// 한 URL에 대한 페이지 세션.
pub struct PageSession {
    client: Client,
    url: String,
    document: Mutex<Option<String>>,
    loads: AtomicU32,
    closed: AtomicBool,
}

impl PageSession {
    pub fn open(client: Client, url: impl Into<String>) -> Self {
        let url = url.into();
        trace!(url = %url, "Session opened");
        Self {
            client,
            url,
            document: Mutex::new(None),
            loads: AtomicU32::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 페이지를 불러온 횟수 (재로드 포함).
    pub fn loads(&self) -> u32 {
        self.loads.load(Ordering::Relaxed)
    }

    /// 페이지로 이동합니다. 2xx가 아니면 실패입니다.
    pub async fn navigate(&self) -> Result<(), FetchError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FetchError::SessionClosed);
        }

        let response = self
            .client
            .get(&self.url)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                url: self.url.clone(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        self.loads.fetch_add(1, Ordering::Relaxed);
        debug!(url = %self.url, bytes = body.len(), "Page loaded");

        *self.document.lock().map_err(|_| FetchError::SessionClosed)? = Some(body);
        Ok(())
    }

    /// 페이지를 다시 불러옵니다.
    pub async fn reload(&self) -> Result<(), FetchError> {
        debug!(url = %self.url, "Reloading page");
        self.navigate().await
    }

    /// 보이는 본문 텍스트를 추출합니다. 비어 있으면 실패입니다.
    pub fn extract_text(&self) -> Result<String, FetchError> {
        let guard = self.document.lock().map_err(|_| FetchError::SessionClosed)?;
        let html = guard.as_deref().ok_or(FetchError::NotLoaded)?;

        let text = visible_text(html);
        if text.is_empty() {
            return Err(FetchError::EmptyContent {
                url: self.url.clone(),
            });
        }
        Ok(text)
    }

    /// 세션을 닫고 불러온 문서를 버립니다.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            if let Ok(mut document) = self.document.lock() {
                document.take();
            }
            trace!(url = %self.url, "Session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        if !self.is_closed() {
            debug!(url = %self.url, "Session dropped without close");
            self.close();
        }
    }
}

/// HTML 문서에서 보이는 텍스트만 추출하고 정리합니다.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            raw.push_str(text);
            raw.push('\n');
        }
    }

    clean_text(&raw)
}

/// 줄마다 공백을 하나로 줄이고 빈 줄을 제거합니다.
pub fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <head><title>AAPL</title><style>.x { color: red }</style></head>
          <body>
            <script>var tracking = 1;</script>
            <h1>Apple   Inc.</h1>

            <div>Previous Close <span>212.41</span></div>
            <noscript>enable js</noscript>
          </body>
        </html>
    "#;

    #[test]
    fn test_visible_text_drops_hidden_elements() {
        let text = visible_text(PAGE);
        assert!(text.contains("Apple Inc."));
        assert!(text.contains("212.41"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color"));
        assert!(!text.contains("enable js"));
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a   b \n\n\n  c  "), "a b\nc");
        assert_eq!(clean_text(" \n \t "), "");
    }

    #[tokio::test]
    async fn test_extract_before_navigate_fails() {
        let session = PageSession::open(Client::new(), "http://localhost/none");
        assert!(matches!(session.extract_text(), Err(FetchError::NotLoaded)));
        session.close();
        assert!(matches!(session.navigate().await, Err(FetchError::SessionClosed)));
    }

    #[tokio::test]
    async fn test_navigate_and_extract() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/quote/AAPL/")
            .with_status(200)
            .with_body(PAGE)
            .create_async()
            .await;

        let session = PageSession::open(Client::new(), format!("{}/quote/AAPL/", server.url()));
        session.navigate().await.unwrap();
        let text = session.extract_text().unwrap();
        session.close();

        mock.assert_async().await;
        assert!(text.contains("Previous Close"));
        assert_eq!(session.loads(), 1);
        assert!(session.is_closed());
    }
}
