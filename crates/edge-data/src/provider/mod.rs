//! 외부 데이터 제공자 클라이언트.
//!
//! - `session`: 요청 단위 페이지 세션 (열기 → 이동 → 본문 추출 → 닫기)
//! - `fetch`: 재시도가 포함된 원격 페이지 클라이언트
//! - `parser`: 원문 → 구조화 JSON 변환기 (외부 협력자)

pub mod fetch;
pub mod parser;
pub mod session;

pub use fetch::{ContentFetcher, RemoteFetchClient};
pub use parser::{extract_section, LlmTextParser, ParseRequest, SchemaHint, TextParser};
pub use session::{clean_text, visible_text, PageSession};
