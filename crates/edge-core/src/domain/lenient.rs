//! 스크래핑 결과용 관대한 역직렬화 함수.
//!
//! 파서가 돌려주는 JSON은 같은 필드라도 숫자(`189.5`), 문자열(`"1,234.56"`, `"12.5%"`),
//! 자리표시자(`"N/A"`, `"--"`)가 섞여 나옵니다. 해석할 수 없는 값은 에러 대신 `None`으로 둡니다.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

use super::merge::Metric;

/// 값이 비어 있음을 뜻하는 자리표시자인지 확인합니다.
pub fn is_placeholder(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed == "--"
        || trimmed == "-"
        || trimmed.eq_ignore_ascii_case("null")
}

/// 숫자 문자열을 f64로 변환합니다.
///
/// 쉼표, 통화 기호, 퍼센트 기호, 앞의 `+`를 제거합니다. `(1.23)` 형식은 음수로 읽습니다.
pub fn parse_number(s: &str) -> Option<f64> {
    if is_placeholder(s) {
        return None;
    }

    let trimmed = s.trim();
    let (negative, body) = match trimmed.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%' | '+' | ' ' | '\u{a0}'))
        .collect();

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// 숫자 또는 숫자 문자열 → `Option<f64>`.
pub fn num<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
        Some(Value::String(s)) => parse_number(&s),
        _ => None,
    })
}

/// 정수 또는 정수 문자열 → `Option<u32>`.
pub fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_number(&s),
        _ => None,
    };
    Ok(parsed
        .filter(|v| *v >= 0.0 && *v <= u32::MAX as f64)
        .map(|v| v.round() as u32))
}

/// 문자열, 숫자, 불리언 → `Option<String>`. 자리표시자는 `None`이 됩니다.
pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !is_placeholder(&s) => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// 배열이 아니면 빈 Vec으로 읽습니다. 해석할 수 없는 원소는 건너뜁니다.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// 하위 섹션 객체. `null`이거나 형태가 맞지 않으면 기본값(빈 섹션)으로 읽습니다.
pub fn subsection<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default())
}

/// 기간별 지표 표(`{"9/30/2024": {"trailing_pe": 31.2, ...}}`).
///
/// 객체가 아닌 항목은 버리고, 숫자나 텍스트로 읽을 수 없는 칸은 `None`으로 둡니다.
pub fn history<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, BTreeMap<String, Option<Metric>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(period, column)| match column {
            Value::Object(cells) => Some((
                period,
                cells
                    .into_iter()
                    .map(|(name, cell)| (name, metric_cell(cell)))
                    .collect(),
            )),
            _ => None,
        })
        .collect())
}

fn metric_cell(cell: Value) -> Option<Metric> {
    match cell {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(Metric::Number),
        Value::String(s) if !is_placeholder(&s) => Some(Metric::Text(s.trim().to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Quote {
        #[serde(default, deserialize_with = "num")]
        price: Option<f64>,
        #[serde(default, deserialize_with = "count")]
        analysts: Option<u32>,
        #[serde(default, deserialize_with = "text")]
        volume: Option<String>,
    }

    #[derive(Deserialize)]
    struct Table {
        #[serde(flatten, deserialize_with = "history")]
        periods: BTreeMap<String, BTreeMap<String, Option<Metric>>>,
    }

    #[test]
    fn test_history_skips_non_object_columns() {
        let table: Table = serde_json::from_str(
            r#"{"currency":"USD","as_of":null,"6/30/2024":{"pe":"N/A","pb":[1,2],"ps":7.1,"ev":"2.9T"}}"#,
        )
        .unwrap();

        assert_eq!(table.periods.len(), 1);
        let column = &table.periods["6/30/2024"];
        assert_eq!(column["pe"], None);
        assert_eq!(column["pb"], None);
        assert_eq!(column["ps"], Some(Metric::Number(7.1)));
        assert_eq!(column["ev"], Some(Metric::Text("2.9T".to_string())));
    }

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number("1,234.56"), Some(1234.56));
        assert_eq!(parse_number("+2.5%"), Some(2.5));
        assert_eq!(parse_number("$189.20"), Some(189.2));
        assert_eq!(parse_number("(0.45)"), Some(-0.45));
        assert_eq!(parse_number("N/A"), None);
        assert_eq!(parse_number("--"), None);
        assert_eq!(parse_number("2.93T"), None);
    }

    #[test]
    fn test_quote_mixed_types() {
        let quote: Quote =
            serde_json::from_str(r#"{"price":"189.50","analysts":"41","volume":52345678}"#)
                .unwrap();
        assert_eq!(quote.price, Some(189.5));
        assert_eq!(quote.analysts, Some(41));
        assert_eq!(quote.volume.as_deref(), Some("52345678"));
    }

    #[test]
    fn test_quote_placeholders_and_missing() {
        let quote: Quote = serde_json::from_str(r#"{"price":"N/A","volume":"--"}"#).unwrap();
        assert_eq!(quote.price, None);
        assert_eq!(quote.analysts, None);
        assert_eq!(quote.volume, None);
    }
}
