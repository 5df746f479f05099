//! 섹션 병합용 trait.
//!
//! 여러 소스의 부분 레코드를 하나로 합칠 때 필드 단위로 우선순위를 적용합니다.
//! 우선순위가 높은 쪽 값이 비어 있을 때만 낮은 쪽 값으로 채웁니다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::lenient::{is_placeholder, parse_number};

/// 빈 값 판정.
///
/// `None`, 공백 문자열, `"N/A"`/`"--"`/`"null"`, 빈 컬렉션은 비어 있는 값입니다.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

/// 누락된 필드를 우선순위가 낮은 값으로 채웁니다.
pub trait FillMissing {
    /// `self`의 빈 필드를 `lower`의 값으로 채웁니다. 이미 값이 있는 필드는 유지합니다.
    fn fill_missing(&mut self, lower: &Self);
}

impl Blank for f64 {
    fn is_blank(&self) -> bool {
        !self.is_finite()
    }
}

impl Blank for u32 {
    fn is_blank(&self) -> bool {
        false
    }
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        is_placeholder(self)
    }
}

impl<T: Blank> Blank for Option<T> {
    fn is_blank(&self) -> bool {
        self.as_ref().map_or(true, Blank::is_blank)
    }
}

impl<T> Blank for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Blank for BTreeMap<K, V> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

/// 단일 값은 통째로 교체합니다.
impl<T: Blank + Clone> FillMissing for Option<T> {
    fn fill_missing(&mut self, lower: &Self) {
        if self.is_blank() && !lower.is_blank() {
            *self = lower.clone();
        }
    }
}

/// 목록은 원소 단위로 섞지 않고 비어 있을 때만 통째로 가져옵니다.
impl<T: Clone> FillMissing for Vec<T> {
    fn fill_missing(&mut self, lower: &Self) {
        if self.is_empty() && !lower.is_empty() {
            *self = lower.clone();
        }
    }
}

/// 맵은 키 단위로 병합합니다.
impl<K, V> FillMissing for BTreeMap<K, V>
where
    K: Ord + Clone,
    V: FillMissing + Clone,
{
    fn fill_missing(&mut self, lower: &Self) {
        for (key, value) in lower {
            match self.get_mut(key) {
                Some(existing) => existing.fill_missing(value),
                None => {
                    self.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

/// 숫자 또는 텍스트로 나오는 지표 값.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    Number(f64),
    Text(String),
}

impl Metric {
    /// 숫자로 해석 가능하면 f64로 반환합니다.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Metric::Number(n) => Some(*n),
            Metric::Text(s) => parse_number(s),
        }
    }
}

impl Blank for Metric {
    fn is_blank(&self) -> bool {
        match self {
            Metric::Number(n) => n.is_blank(),
            Metric::Text(s) => s.is_blank(),
        }
    }
}

impl From<f64> for Metric {
    fn from(value: f64) -> Self {
        Metric::Number(value)
    }
}

impl From<&str> for Metric {
    fn from(value: &str) -> Self {
        Metric::Text(value.to_string())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Number(n) => write!(f, "{}", n),
            Metric::Text(s) => write!(f, "{}", s),
        }
    }
}

/// 섹션 구조체를 선언하고 `Blank`/`FillMissing`을 필드 단위로 구현합니다.
///
/// 모든 필드는 `#[serde(default)]`로 누락을 허용합니다.
#[macro_export]
macro_rules! section {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                pub $field:ident : $ty:ty,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $ty,
            )*
        }

        impl $crate::domain::merge::Blank for $name {
            fn is_blank(&self) -> bool {
                true $(&& $crate::domain::merge::Blank::is_blank(&self.$field))*
            }
        }

        impl $crate::domain::merge::FillMissing for $name {
            fn fill_missing(&mut self, lower: &Self) {
                $( $crate::domain::merge::FillMissing::fill_missing(&mut self.$field, &lower.$field); )*
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::section! {
        pub struct Sample {
            pub price: Option<f64>,
            pub label: Option<String>,
            pub tags: Vec<String>,
            pub levels: BTreeMap<String, Option<f64>>,
        }
    }

    #[test]
    fn test_blank_values() {
        assert!(Option::<f64>::None.is_blank());
        assert!(Some("N/A".to_string()).is_blank());
        assert!(Some("  ".to_string()).is_blank());
        assert!(Some(f64::NAN).is_blank());
        assert!(!Some(0.0).is_blank());
        assert!(Sample::default().is_blank());
    }

    #[test]
    fn test_fill_missing_keeps_higher_priority() {
        let mut high = Sample {
            price: Some(10.0),
            label: Some("--".to_string()),
            ..Default::default()
        };
        let low = Sample {
            price: Some(20.0),
            label: Some("low".to_string()),
            tags: vec!["a".to_string()],
            ..Default::default()
        };

        high.fill_missing(&low);

        assert_eq!(high.price, Some(10.0));
        assert_eq!(high.label.as_deref(), Some("low"));
        assert_eq!(high.tags, vec!["a".to_string()]);
    }

    #[test]
    fn test_fill_missing_map_merges_by_key() {
        let mut high = Sample::default();
        high.levels.insert("R1".to_string(), Some(1.0));
        high.levels.insert("S1".to_string(), None);

        let mut low = Sample::default();
        low.levels.insert("R1".to_string(), Some(9.0));
        low.levels.insert("S1".to_string(), Some(0.5));
        low.levels.insert("P".to_string(), Some(0.7));

        high.fill_missing(&low);

        assert_eq!(high.levels["R1"], Some(1.0));
        assert_eq!(high.levels["S1"], Some(0.5));
        assert_eq!(high.levels["P"], Some(0.7));
    }

    #[test]
    fn test_metric_untagged() {
        let number: Metric = serde_json::from_str("1.25").unwrap();
        let text: Metric = serde_json::from_str("\"1.25\"").unwrap();
        assert_eq!(number.as_f64(), Some(1.25));
        assert_eq!(text.as_f64(), Some(1.25));
        assert!(Metric::from("N/A").is_blank());
    }
}
