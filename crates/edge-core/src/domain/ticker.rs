//! 티커 심볼.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

const MAX_LEN: usize = 16;

/// 정규화된(대문자) 티커 심볼.
///
/// 캐시 키, 잠금 키, 알림 채널 이름에 그대로 사용되므로 생성 시 검증합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// 심볼을 검증하고 대문자로 정규화합니다.
    ///
    /// 영숫자와 `.`, `-`, `^`, `=`만 허용합니다 (예: `BRK.B`, `^GSPC`, `EURUSD=X`).
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let symbol = raw.trim().to_uppercase();

        if symbol.is_empty() || symbol.len() > MAX_LEN {
            return Err(CoreError::InvalidTicker(raw.to_string()));
        }

        let valid = symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
        if !valid {
            return Err(CoreError::InvalidTicker(raw.to_string()));
        }

        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 캐시 키 (`ticker:{SYMBOL}`)
    pub fn cache_key(&self) -> String {
        format!("ticker:{}", self.0)
    }

    /// 잠금 키 (`lock:{SYMBOL}`)
    pub fn lock_key(&self) -> String {
        format!("lock:{}", self.0)
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ticker {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_normalizes_case() {
        let ticker = Ticker::parse(" aapl ").unwrap();
        assert_eq!(ticker.as_str(), "AAPL");
        assert_eq!(ticker.cache_key(), "ticker:AAPL");
        assert_eq!(ticker.lock_key(), "lock:AAPL");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(Ticker::parse("").is_err());
        assert!(Ticker::parse("AA PL").is_err());
        assert!(Ticker::parse("lock:AAPL").is_err());
        assert!(Ticker::parse("ABCDEFGHIJKLMNOPQ").is_err());
        assert!(Ticker::parse("BRK.B").is_ok());
        assert!(Ticker::parse("^GSPC").is_ok());
    }

    #[test]
    fn test_serde_as_string() {
        let ticker: Ticker = serde_json::from_str("\"msft\"").unwrap();
        assert_eq!(ticker.as_str(), "MSFT");
        assert_eq!(serde_json::to_string(&ticker).unwrap(), "\"MSFT\"");
        assert!(serde_json::from_str::<Ticker>("\"a b\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_parse_is_idempotent(raw in "[a-zA-Z0-9.^=-]{1,16}") {
            let first = Ticker::parse(&raw).unwrap();
            let second = Ticker::parse(first.as_str()).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
