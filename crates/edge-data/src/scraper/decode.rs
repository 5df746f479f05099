//! 파서 결과 → 부분 레코드 변환.
//!
//! 주 섹션을 역직렬화하고, 같은 페이지에서 얻을 수 있는 다른 섹션 필드를 보조 기여로 만듭니다.

use serde_json::Value;

use edge_core::{Analysis, Fundamental, Metric, Overview, Technicals};

use super::{PartialRecord, SourceKind};

/// 파서가 돌려준 섹션 JSON을 부분 레코드로 변환합니다.
pub fn decode(kind: SourceKind, section: Value) -> Result<PartialRecord, serde_json::Error> {
    let record = match kind {
        SourceKind::Overview => {
            let overview: Overview = serde_json::from_value(section)?;
            PartialRecord {
                fundamental: Some(fundamental_from_overview(&overview)),
                analysis: Some(analysis_from_overview(&overview)),
                overview: Some(overview),
                technicals: None,
            }
        }
        SourceKind::Fundamental => {
            let fundamental: Fundamental = serde_json::from_value(section)?;
            PartialRecord {
                overview: Some(overview_from_fundamental(&fundamental)),
                fundamental: Some(fundamental),
                analysis: None,
                technicals: None,
            }
        }
        SourceKind::Analysis => {
            let analysis: Analysis = serde_json::from_value(section)?;
            PartialRecord {
                overview: Some(overview_from_analysis(&analysis)),
                analysis: Some(analysis),
                fundamental: None,
                technicals: None,
            }
        }
        SourceKind::Technicals => {
            let technicals: Technicals = serde_json::from_value(section)?;
            PartialRecord {
                technicals: Some(technicals),
                ..Default::default()
            }
        }
    };
    Ok(record)
}

/// overview 페이지 → fundamental 보조 (beta, trailing P/E).
fn fundamental_from_overview(overview: &Overview) -> Fundamental {
    let mut fundamental = Fundamental::default();
    fundamental.trading_information.beta = overview.beta.map(Metric::Number);
    fundamental.valuation_measures.current.trailing_pe = overview.pe_ratio;
    fundamental
}

/// overview 페이지 → analysis 보조 (1년 목표가 평균만).
fn analysis_from_overview(overview: &Overview) -> Analysis {
    let mut analysis = Analysis::default();
    analysis.analyst_ratings.price_target_avg = overview.one_year_target_est;
    analysis
}

/// key statistics 페이지 → overview 보조 (시가총액, beta, P/E, 52주 범위).
fn overview_from_fundamental(fundamental: &Fundamental) -> Overview {
    let current = &fundamental.valuation_measures.current;
    let trading = &fundamental.trading_information;

    let fifty_two_week_range = match (trading.fifty_two_week_low, trading.fifty_two_week_high) {
        (Some(low), Some(high)) => Some(format!("{:.2} - {:.2}", low, high)),
        _ => None,
    };

    Overview {
        market_cap: current.market_cap.map(format_large_number),
        beta: trading.beta.as_ref().and_then(Metric::as_f64),
        pe_ratio: current.trailing_pe,
        fifty_two_week_range,
        ..Default::default()
    }
}

/// analysis 페이지 → overview 보조 (1년 목표가).
fn overview_from_analysis(analysis: &Analysis) -> Overview {
    Overview {
        one_year_target_est: analysis.analyst_ratings.price_target_avg,
        ..Default::default()
    }
}

/// 큰 숫자를 `3.15T` 형식으로 표기합니다.
fn format_large_number(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    UNITS
        .iter()
        .find(|(scale, _)| value.abs() >= *scale)
        .map(|(scale, unit)| format!("{:.3}{}", value / scale, unit))
        .unwrap_or_else(|| format!("{}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overview_contributes_to_other_sections() {
        let record = decode(
            SourceKind::Overview,
            json!({"current_price": 211.16, "beta": 1.21, "pe_ratio": "32.89", "1y_target_est": 228.6}),
        )
        .unwrap();

        assert_eq!(record.overview.as_ref().unwrap().current_price, Some(211.16));
        let fundamental = record.fundamental.unwrap();
        assert_eq!(fundamental.trading_information.beta, Some(Metric::Number(1.21)));
        assert_eq!(fundamental.valuation_measures.current.trailing_pe, Some(32.89));
        let analysis = record.analysis.unwrap();
        assert_eq!(analysis.analyst_ratings.price_target_avg, Some(228.6));
        assert!(analysis.analyst_ratings.current_rating.is_none());
        assert!(record.technicals.is_none());
    }

    #[test]
    fn test_fundamental_contributes_to_overview() {
        let record = decode(
            SourceKind::Fundamental,
            json!({
                "valuation_measures": {"current": {"market_cap": 3154000000000.0, "trailing_pe": 32.9}},
                "trading_information": {"beta": "1.21", "52_week_low": 169.21, "52_week_high": 260.1}
            }),
        )
        .unwrap();

        let overview = record.overview.unwrap();
        assert_eq!(overview.market_cap.as_deref(), Some("3.154T"));
        assert_eq!(overview.beta, Some(1.21));
        assert_eq!(overview.pe_ratio, Some(32.9));
        assert_eq!(overview.fifty_two_week_range.as_deref(), Some("169.21 - 260.10"));
    }

    #[test]
    fn test_fundamental_survives_stray_valuation_keys() {
        let record = decode(
            SourceKind::Fundamental,
            json!({
                "valuation_measures": {
                    "current": {"trailing_pe": 32.9},
                    "currency": "USD",
                    "9/30/2024": null
                },
                "financial_highlights": null
            }),
        )
        .unwrap();

        let fundamental = record.fundamental.unwrap();
        assert!(fundamental.valuation_measures.history.is_empty());
        assert_eq!(record.overview.unwrap().pe_ratio, Some(32.9));
    }

    #[test]
    fn test_technicals_only_contributes_itself() {
        let record = decode(SourceKind::Technicals, json!({"pivots": {}})).unwrap();
        assert!(record.technicals.is_some());
        assert!(record.overview.is_none());
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(decode(SourceKind::Analysis, json!("nothing here")).is_err());
    }

    #[test]
    fn test_format_large_number() {
        assert_eq!(format_large_number(2.5e9), "2.500B");
        assert_eq!(format_large_number(950.0), "950");
    }
}
