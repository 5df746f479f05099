//! 비정형 텍스트 파서 클라이언트.
//!
//! 페이지 원문과 스키마 힌트를 외부 생성형 모델에 보내고 ```json 블록으로 받은 결과에서
//! 섹션 루트 키 아래 값을 꺼냅니다. 응답은 신뢰하지 않으며 실패는 `ParseError`입니다.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use tracing::{debug, instrument};

use edge_core::{Analysis, Fundamental, Overview, ParserConfig, Technicals};

use crate::error::ParseError;

/// 기대하는 결과 구조.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaHint {
    Overview,
    Fundamental,
    Analysis,
    Technicals,
    Insights,
}

impl SchemaHint {
    /// 응답 JSON의 루트 키.
    pub fn root_key(&self) -> &'static str {
        match self {
            SchemaHint::Overview => "overview",
            SchemaHint::Fundamental => "fundamental",
            SchemaHint::Analysis => "analysis",
            SchemaHint::Technicals => "technicals",
            SchemaHint::Insights => "ai_insights",
        }
    }

    fn source_description(&self) -> &'static str {
        match self {
            SchemaHint::Overview => "Yahoo Finance's quote overview page",
            SchemaHint::Fundamental => "Yahoo Finance's key statistics page",
            SchemaHint::Analysis => "Yahoo Finance's analyst analysis page",
            SchemaHint::Technicals => "TradingView's technical analysis page",
            SchemaHint::Insights => "a consolidated stock data summary",
        }
    }

    /// 섹션 타입의 기본값을 직렬화해 필드 구조 예시를 만듭니다.
    fn skeleton(&self) -> Value {
        let section = match self {
            SchemaHint::Overview => serde_json::to_value(Overview::default()),
            SchemaHint::Fundamental => serde_json::to_value(Fundamental::default()),
            SchemaHint::Analysis => serde_json::to_value(Analysis::default()),
            SchemaHint::Technicals => serde_json::to_value(Technicals::default()),
            SchemaHint::Insights => Ok(json!({
                "summary": "Brief overview of the stock's performance",
                "recommendation": {"action": "Buy | Sell | Hold", "confidence": 0, "reasoning": ""},
                "key_takeaways": ["3-5 short bullet points"],
                "visualization_data": {
                    "price_trend": [{"x": "label", "y": 0.0}],
                    "bullishness_meter": 0,
                    "risk_score": 0
                }
            })),
        };
        json!({ self.root_key(): section.unwrap_or(Value::Null) })
    }

    fn extra_rules(&self) -> &'static str {
        match self {
            SchemaHint::Overview => "",
            SchemaHint::Fundamental => {
                "Besides \"current\", add one object per historical quarter under \"valuation_measures\", keyed by its date (e.g. \"9/30/2024\").\n"
            }
            SchemaHint::Analysis => {
                "\"earnings_history\" is keyed by quarter end date. \"ratings\" lists individual analyst actions with firm, rating, price_target and date.\n"
            }
            SchemaHint::Technicals => {
                "\"oscillators\" and \"moving_averages\" list each indicator with name, value and action. \"pivots\" is keyed by method (Classic, Fibonacci, Camarilla, Woodie, DM), each with R3, R2, R1, P, S1, S2, S3.\n"
            }
            SchemaHint::Insights => {
                "\"confidence\", \"bullishness_meter\" and \"risk_score\" are integers from 0 to 100.\n"
            }
        }
    }

    /// 프롬프트를 생성합니다.
    pub fn prompt(&self, raw_text: &str) -> String {
        let skeleton = serde_json::to_string_pretty(&self.skeleton()).unwrap_or_default();
        format!(
            "Parse the following raw text from {source} into a JSON object with a fixed structure under the root key \"{root}\".\n\
             Keep every field shown below. Use numbers for numeric values and strings otherwise. \
             If data is missing, use null to maintain structure.\n\
             {extra}\
             Exclude irrelevant text (navigation, ads, related tickers). \
             Return only the JSON object, enclosed in ```json``` markers.\n\n\
             Structure:\n{skeleton}\n\nText:\n{raw_text}\n",
            source = self.source_description(),
            root = self.root_key(),
            extra = self.extra_rules(),
        )
    }
}

impl fmt::Display for SchemaHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root_key())
    }
}

/// 파서 요청.
#[derive(Debug, Clone)]
pub struct ParseRequest {
    pub raw_text: String,
    pub schema_hint: SchemaHint,
}

impl ParseRequest {
    pub fn new(raw_text: impl Into<String>, schema_hint: SchemaHint) -> Self {
        Self {
            raw_text: raw_text.into(),
            schema_hint,
        }
    }
}

/// 원문 → 구조화 JSON 변환기.
///
/// 성공 시 루트 키 아래의 값만 반환합니다.
#[async_trait]
pub trait TextParser: Send + Sync {
    async fn parse(&self, request: ParseRequest) -> Result<Value, ParseError>;
}

/// generateContent 형식 HTTP API를 사용하는 파서.
pub struct LlmTextParser {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    max_input_chars: usize,
    temperature: f32,
    max_output_tokens: u32,
}

impl LlmTextParser {
    /// 설정에서 생성합니다.
    pub fn from_config(config: &ParserConfig) -> Result<Self, ParseError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            max_input_chars: config.max_input_chars,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn truncate<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.max_input_chars) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[async_trait]
impl TextParser for LlmTextParser {
    #[instrument(skip(self, request), fields(hint = %request.schema_hint, chars = request.raw_text.len()))]
    async fn parse(&self, request: ParseRequest) -> Result<Value, ParseError> {
        let api_key = self.api_key.as_deref().ok_or(ParseError::NotConfigured)?;
        let prompt = request
            .schema_hint
            .prompt(self.truncate(&request.raw_text));

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens,
            }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ParseError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let reply: GenerateResponse = response.json().await?;
        let text = reply
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
            .ok_or(ParseError::EmptyReply)?;

        let value = extract_section(&text, request.schema_hint.root_key())?;
        debug!("Parsed structured section");
        Ok(value)
    }
}

/// 응답 텍스트의 ```json 블록에서 루트 키 아래 값을 꺼냅니다.
pub fn extract_section(reply: &str, root_key: &'static str) -> Result<Value, ParseError> {
    let block = json_block(reply).ok_or(ParseError::MissingJsonBlock)?;
    let mut parsed: Value = serde_json::from_str(block)?;

    match parsed.get_mut(root_key).map(Value::take) {
        Some(Value::Null) | None => Err(ParseError::MissingRootKey(root_key)),
        Some(section) => Ok(section),
    }
}

fn json_block(reply: &str) -> Option<&str> {
    let start = reply.find("```json")? + "```json".len();
    let rest = &reply[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser(endpoint: String) -> LlmTextParser {
        let config = ParserConfig {
            endpoint,
            api_key: Some("test-key".to_string()),
            max_input_chars: 10,
            ..Default::default()
        };
        LlmTextParser::from_config(&config).unwrap()
    }

    fn reply(text: &str) -> String {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}).to_string()
    }

    #[test]
    fn test_extract_section() {
        let text = "Here you go:\n```json\n{\"overview\": {\"current_price\": 211.16}}\n```\n";
        let section = extract_section(text, "overview").unwrap();
        assert_eq!(section["current_price"], 211.16);
    }

    #[test]
    fn test_extract_section_failures() {
        assert!(matches!(
            extract_section("{\"overview\": {}}", "overview"),
            Err(ParseError::MissingJsonBlock)
        ));
        assert!(matches!(
            extract_section("```json\n{oops\n```", "overview"),
            Err(ParseError::InvalidJson(_))
        ));
        assert!(matches!(
            extract_section("```json\n{\"analysis\": {}}\n```", "overview"),
            Err(ParseError::MissingRootKey("overview"))
        ));
    }

    #[test]
    fn test_prompt_contains_wire_fields() {
        let prompt = SchemaHint::Overview.prompt("raw");
        assert!(prompt.contains("\"52_week_range\""));
        assert!(prompt.contains("root key \"overview\""));

        let prompt = SchemaHint::Analysis.prompt("raw");
        assert!(prompt.contains("\"Current Qtr\""));
    }

    #[tokio::test]
    async fn test_parse_posts_truncated_prompt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/generate")
            .match_query(mockito::Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(mockito::Matcher::Regex("Text:\\\\n0123456789\\\\n".into()))
            .with_status(200)
            .with_body(reply(
                "```json\n{\"technicals\": {\"summary\": {\"oscillators\": {\"buy\": 3}}}}\n```",
            ))
            .create_async()
            .await;

        let section = parser(format!("{}/generate", server.url()))
            .parse(ParseRequest::new("0123456789ABCDEF", SchemaHint::Technicals))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(section["summary"]["oscillators"]["buy"], 3);
    }

    #[tokio::test]
    async fn test_parse_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generate")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let result = parser(format!("{}/generate", server.url()))
            .parse(ParseRequest::new("text", SchemaHint::Overview))
            .await;
        assert!(matches!(result, Err(ParseError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let parser = LlmTextParser::from_config(&ParserConfig::default()).unwrap();
        let result = parser
            .parse(ParseRequest::new("text", SchemaHint::Overview))
            .await;
        assert!(matches!(result, Err(ParseError::NotConfigured)));
    }
}
