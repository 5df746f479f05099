//! CompositeRecord의 섹션 타입.
//!
//! JSON 필드명은 외부에 이미 공개된 이름(`52_week_range`, `Current Qtr` 등)을 그대로 사용합니다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::lenient::{count, history, list, num, subsection, text};
use super::merge::{Blank, FillMissing, Metric};
use crate::section;

// ==================== Overview ====================

section! {
    /// 시세 요약.
    pub struct Overview {
        #[serde(deserialize_with = "num")]
        pub current_price: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub change: Option<f64>,
        #[serde(deserialize_with = "text")]
        pub percent_change: Option<String>,
        #[serde(deserialize_with = "num")]
        pub previous_close: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub open: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub bid: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub ask: Option<f64>,
        #[serde(deserialize_with = "text")]
        pub day_range: Option<String>,
        #[serde(rename = "52_week_range", deserialize_with = "text")]
        pub fifty_two_week_range: Option<String>,
        #[serde(deserialize_with = "text")]
        pub volume: Option<String>,
        #[serde(deserialize_with = "text")]
        pub avg_volume: Option<String>,
        #[serde(deserialize_with = "text")]
        pub market_cap: Option<String>,
        #[serde(deserialize_with = "num")]
        pub beta: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub pe_ratio: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub eps: Option<f64>,
        #[serde(deserialize_with = "text")]
        pub earnings_date: Option<String>,
        #[serde(deserialize_with = "text")]
        pub forward_dividend_yield: Option<String>,
        #[serde(deserialize_with = "text")]
        pub ex_dividend_date: Option<String>,
        #[serde(rename = "1y_target_est", deserialize_with = "num")]
        pub one_year_target_est: Option<f64>,
    }
}

// ==================== Fundamental ====================

section! {
    /// 현재 시점 밸류에이션.
    pub struct ValuationSnapshot {
        #[serde(deserialize_with = "num")]
        pub market_cap: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub enterprise_value: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub trailing_pe: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub forward_pe: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub peg_ratio: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub price_sales: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub price_book: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub enterprise_value_revenue: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub enterprise_value_ebitda: Option<f64>,
    }
}

section! {
    /// 밸류에이션 지표. `current` 외의 키는 과거 분기(예: `"9/30/2024"`)입니다.
    pub struct ValuationMeasures {
        #[serde(deserialize_with = "subsection")]
        pub current: ValuationSnapshot,
        #[serde(flatten, deserialize_with = "history")]
        pub history: BTreeMap<String, BTreeMap<String, Option<Metric>>>,
    }
}

section! {
    pub struct Profitability {
        #[serde(deserialize_with = "text")]
        pub profit_margin: Option<String>,
        #[serde(deserialize_with = "text")]
        pub operating_margin: Option<String>,
    }
}

section! {
    pub struct ManagementEffectiveness {
        #[serde(deserialize_with = "text")]
        pub return_on_assets: Option<String>,
        #[serde(deserialize_with = "text")]
        pub return_on_equity: Option<String>,
    }
}

section! {
    pub struct IncomeStatement {
        #[serde(deserialize_with = "text")]
        pub revenue_ttm: Option<String>,
        #[serde(deserialize_with = "text")]
        pub revenue_per_share_ttm: Option<String>,
        #[serde(deserialize_with = "text")]
        pub quarterly_revenue_growth: Option<String>,
        #[serde(deserialize_with = "text")]
        pub gross_profit_ttm: Option<String>,
        #[serde(deserialize_with = "text")]
        pub ebitda: Option<String>,
        #[serde(deserialize_with = "text")]
        pub net_income_ttm: Option<String>,
        #[serde(deserialize_with = "text")]
        pub diluted_eps_ttm: Option<String>,
        #[serde(deserialize_with = "text")]
        pub quarterly_earnings_growth: Option<String>,
    }
}

section! {
    pub struct BalanceSheet {
        #[serde(deserialize_with = "text")]
        pub total_cash: Option<String>,
        #[serde(deserialize_with = "text")]
        pub total_cash_per_share: Option<String>,
        #[serde(deserialize_with = "text")]
        pub total_debt: Option<String>,
        #[serde(deserialize_with = "text")]
        pub total_debt_equity: Option<String>,
        #[serde(deserialize_with = "text")]
        pub current_ratio: Option<String>,
        #[serde(deserialize_with = "text")]
        pub book_value_per_share: Option<String>,
    }
}

section! {
    pub struct CashFlowStatement {
        #[serde(deserialize_with = "text")]
        pub operating_cash_flow: Option<String>,
        #[serde(deserialize_with = "text")]
        pub levered_free_cash_flow: Option<String>,
    }
}

section! {
    /// 재무 하이라이트.
    pub struct FinancialHighlights {
        #[serde(deserialize_with = "text")]
        pub fiscal_year_ends: Option<String>,
        #[serde(deserialize_with = "text")]
        pub most_recent_quarter: Option<String>,
        #[serde(deserialize_with = "subsection")]
        pub profitability: Profitability,
        #[serde(deserialize_with = "subsection")]
        pub management_effectiveness: ManagementEffectiveness,
        #[serde(deserialize_with = "subsection")]
        pub income_statement: IncomeStatement,
        #[serde(deserialize_with = "subsection")]
        pub balance_sheet: BalanceSheet,
        #[serde(deserialize_with = "subsection")]
        pub cash_flow_statement: CashFlowStatement,
    }
}

section! {
    /// 거래 정보.
    pub struct TradingInformation {
        pub beta: Option<Metric>,
        #[serde(rename = "52_week_change", deserialize_with = "text")]
        pub fifty_two_week_change: Option<String>,
        #[serde(rename = "52_week_high", deserialize_with = "num")]
        pub fifty_two_week_high: Option<f64>,
        #[serde(rename = "52_week_low", deserialize_with = "num")]
        pub fifty_two_week_low: Option<f64>,
        #[serde(rename = "50_day_moving_average", deserialize_with = "num")]
        pub fifty_day_moving_average: Option<f64>,
        #[serde(rename = "200_day_moving_average", deserialize_with = "num")]
        pub two_hundred_day_moving_average: Option<f64>,
        #[serde(deserialize_with = "text")]
        pub avg_vol_3month: Option<String>,
        #[serde(deserialize_with = "text")]
        pub avg_vol_10day: Option<String>,
        #[serde(deserialize_with = "text")]
        pub shares_outstanding: Option<String>,
        #[serde(deserialize_with = "text")]
        pub float: Option<String>,
        #[serde(deserialize_with = "text")]
        pub percent_held_by_insiders: Option<String>,
        #[serde(deserialize_with = "text")]
        pub percent_held_by_institutions: Option<String>,
        #[serde(deserialize_with = "text")]
        pub shares_short: Option<String>,
        #[serde(deserialize_with = "num")]
        pub short_ratio: Option<f64>,
        #[serde(deserialize_with = "text")]
        pub short_percent_of_float: Option<String>,
        #[serde(deserialize_with = "text")]
        pub short_percent_of_shares_outstanding: Option<String>,
        #[serde(deserialize_with = "text")]
        pub shares_short_prior_month: Option<String>,
    }
}

section! {
    /// 기본적 분석 지표 (key statistics).
    pub struct Fundamental {
        #[serde(deserialize_with = "subsection")]
        pub valuation_measures: ValuationMeasures,
        #[serde(deserialize_with = "subsection")]
        pub financial_highlights: FinancialHighlights,
        #[serde(deserialize_with = "subsection")]
        pub trading_information: TradingInformation,
    }
}

// ==================== Analysis ====================

/// 분기/연도별 추정치 묶음.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Periods<T> {
    #[serde(rename = "Current Qtr")]
    pub current_qtr: T,
    #[serde(rename = "Next Qtr")]
    pub next_qtr: T,
    #[serde(rename = "Current Year")]
    pub current_year: T,
    #[serde(rename = "Next Year")]
    pub next_year: T,
}

impl<T> Periods<T> {
    /// 기간 이름과 값을 순서대로 반환합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &T)> {
        [
            ("Current Qtr", &self.current_qtr),
            ("Next Qtr", &self.next_qtr),
            ("Current Year", &self.current_year),
            ("Next Year", &self.next_year),
        ]
        .into_iter()
    }
}

impl<T: Blank> Blank for Periods<T> {
    fn is_blank(&self) -> bool {
        self.iter().all(|(_, value)| value.is_blank())
    }
}

impl<T: FillMissing> FillMissing for Periods<T> {
    fn fill_missing(&mut self, lower: &Self) {
        self.current_qtr.fill_missing(&lower.current_qtr);
        self.next_qtr.fill_missing(&lower.next_qtr);
        self.current_year.fill_missing(&lower.current_year);
        self.next_year.fill_missing(&lower.next_year);
    }
}

section! {
    /// EPS 추정치.
    pub struct EpsEstimate {
        #[serde(deserialize_with = "num")]
        pub avg_estimate: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub low_estimate: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub high_estimate: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub year_ago_eps: Option<f64>,
    }
}

section! {
    /// 매출 추정치.
    pub struct RevenueEstimate {
        #[serde(deserialize_with = "text")]
        pub avg_estimate: Option<String>,
        #[serde(deserialize_with = "text")]
        pub low_estimate: Option<String>,
        #[serde(deserialize_with = "text")]
        pub high_estimate: Option<String>,
        #[serde(deserialize_with = "text")]
        pub year_ago_sales: Option<String>,
        #[serde(deserialize_with = "text")]
        pub sales_growth: Option<String>,
    }
}

section! {
    /// 분기 실적 이력 한 건.
    pub struct EarningsHistoryEntry {
        pub eps_estimate: Option<Metric>,
        pub eps_actual: Option<Metric>,
        pub difference: Option<Metric>,
        #[serde(deserialize_with = "text")]
        pub surprise_percent: Option<String>,
    }
}

section! {
    /// 애널리스트 개별 의견.
    pub struct AnalystRating {
        #[serde(deserialize_with = "text")]
        pub firm: Option<String>,
        #[serde(deserialize_with = "text")]
        pub rating: Option<String>,
        #[serde(deserialize_with = "num")]
        pub price_target: Option<f64>,
        #[serde(deserialize_with = "text")]
        pub date: Option<String>,
    }
}

section! {
    /// 애널리스트 의견 요약.
    pub struct AnalystRatings {
        #[serde(deserialize_with = "text")]
        pub current_rating: Option<String>,
        #[serde(deserialize_with = "num")]
        pub price_target_avg: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub price_target_low: Option<f64>,
        #[serde(deserialize_with = "num")]
        pub price_target_high: Option<f64>,
        #[serde(deserialize_with = "count")]
        pub number_of_analysts: Option<u32>,
        #[serde(deserialize_with = "list")]
        pub ratings: Vec<AnalystRating>,
    }
}

section! {
    /// 애널리스트 분석.
    pub struct Analysis {
        #[serde(deserialize_with = "subsection")]
        pub earnings_estimates: Periods<EpsEstimate>,
        #[serde(deserialize_with = "subsection")]
        pub revenue_estimates: Periods<RevenueEstimate>,
        #[serde(deserialize_with = "subsection")]
        pub earnings_history: BTreeMap<String, EarningsHistoryEntry>,
        #[serde(deserialize_with = "subsection")]
        pub analyst_ratings: AnalystRatings,
    }
}

// ==================== Technicals ====================

section! {
    /// 매수/중립/매도 신호 집계.
    pub struct SignalTally {
        #[serde(deserialize_with = "count")]
        pub sell: Option<u32>,
        #[serde(deserialize_with = "count")]
        pub neutral: Option<u32>,
        #[serde(deserialize_with = "count")]
        pub buy: Option<u32>,
        #[serde(deserialize_with = "text")]
        pub overall: Option<String>,
    }
}

section! {
    pub struct TechnicalSummary {
        #[serde(deserialize_with = "subsection")]
        pub oscillators: SignalTally,
        #[serde(deserialize_with = "subsection")]
        pub moving_averages: SignalTally,
    }
}

section! {
    /// 지표 하나의 값과 신호.
    pub struct IndicatorReading {
        #[serde(deserialize_with = "text")]
        pub name: Option<String>,
        pub value: Option<Metric>,
        #[serde(deserialize_with = "text")]
        pub action: Option<String>,
    }
}

section! {
    /// 피벗 포인트 레벨.
    pub struct PivotLevels {
        #[serde(rename = "R3", deserialize_with = "num")]
        pub r3: Option<f64>,
        #[serde(rename = "R2", deserialize_with = "num")]
        pub r2: Option<f64>,
        #[serde(rename = "R1", deserialize_with = "num")]
        pub r1: Option<f64>,
        #[serde(rename = "P", deserialize_with = "num")]
        pub p: Option<f64>,
        #[serde(rename = "S1", deserialize_with = "num")]
        pub s1: Option<f64>,
        #[serde(rename = "S2", deserialize_with = "num")]
        pub s2: Option<f64>,
        #[serde(rename = "S3", deserialize_with = "num")]
        pub s3: Option<f64>,
    }
}

section! {
    /// 기술적 분석.
    ///
    /// `pivots` 키는 계산 방식 이름입니다 (Classic, Fibonacci, Camarilla, Woodie, DM).
    pub struct Technicals {
        #[serde(deserialize_with = "subsection")]
        pub summary: TechnicalSummary,
        #[serde(deserialize_with = "list")]
        pub oscillators: Vec<IndicatorReading>,
        #[serde(deserialize_with = "list")]
        pub moving_averages: Vec<IndicatorReading>,
        #[serde(deserialize_with = "subsection")]
        pub pivots: BTreeMap<String, PivotLevels>,
    }
}

// ==================== Insights ====================

/// 투자 의견.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

/// 의견과 근거.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: Action,
    /// 0 ~ 100
    pub confidence: f64,
    pub reasoning: String,
}

/// 차트용 좌표.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub x: String,
    pub y: f64,
}

/// 시각화 데이터.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationData {
    pub price_trend: Vec<TrendPoint>,
    /// 0 ~ 100
    pub bullishness_meter: f64,
    /// 0 ~ 100
    pub risk_score: f64,
}

/// 병합된 레코드를 요약한 인사이트.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub summary: String,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub key_takeaways: Vec<String>,
    #[serde(default)]
    pub visualization_data: VisualizationData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_wire_names() {
        let overview: Overview = serde_json::from_str(
            r#"{"current_price":"189.84","52_week_range":"164.08 - 199.62","1y_target_est":210.5,"volume":"N/A"}"#,
        )
        .unwrap();

        assert_eq!(overview.current_price, Some(189.84));
        assert_eq!(overview.fifty_two_week_range.as_deref(), Some("164.08 - 199.62"));
        assert_eq!(overview.one_year_target_est, Some(210.5));
        assert_eq!(overview.volume, None);

        let json = serde_json::to_value(&overview).unwrap();
        assert!(json.get("52_week_range").is_some());
        assert!(json.get("1y_target_est").is_some());
        assert!(json.get("market_cap").unwrap().is_null());
    }

    #[test]
    fn test_valuation_history_flatten() {
        let measures: ValuationMeasures = serde_json::from_str(
            r#"{"current":{"trailing_pe":"29.5"},"9/30/2024":{"trailing_pe":31.2,"forward_pe":null}}"#,
        )
        .unwrap();

        assert_eq!(measures.current.trailing_pe, Some(29.5));
        let quarter = &measures.history["9/30/2024"];
        assert_eq!(quarter["trailing_pe"], Some(Metric::Number(31.2)));
        assert_eq!(quarter["forward_pe"], None);
    }

    #[test]
    fn test_valuation_tolerates_stray_keys() {
        let measures: ValuationMeasures = serde_json::from_str(
            r#"{"current":{"trailing_pe":"29.5"},"currency":"USD","as_of":null,
                "6/30/2024":{"trailing_pe":"N/A","peg_ratio":[1.2],"forward_pe":28.1}}"#,
        )
        .unwrap();

        assert_eq!(measures.current.trailing_pe, Some(29.5));
        assert_eq!(measures.history.len(), 1);
        let quarter = &measures.history["6/30/2024"];
        assert_eq!(quarter["trailing_pe"], None);
        assert_eq!(quarter["peg_ratio"], None);
        assert_eq!(quarter["forward_pe"], Some(Metric::Number(28.1)));
    }

    #[test]
    fn test_fundamental_null_subsections() {
        let fundamental: Fundamental = serde_json::from_str(
            r#"{
                "valuation_measures": {"current": {"trailing_pe": 29.5}, "as_of": null},
                "financial_highlights": null,
                "trading_information": "unavailable"
            }"#,
        )
        .unwrap();

        assert_eq!(fundamental.valuation_measures.current.trailing_pe, Some(29.5));
        assert!(fundamental.valuation_measures.history.is_empty());
        assert!(fundamental.financial_highlights.is_blank());
        assert!(fundamental.trading_information.is_blank());
    }

    #[test]
    fn test_analysis_periods_and_ratings() {
        let analysis: Analysis = serde_json::from_str(
            r#"{
                "earnings_estimates": {"Current Qtr": {"avg_estimate": 1.5}},
                "analyst_ratings": {"number_of_analysts": "38", "ratings": "unavailable"}
            }"#,
        )
        .unwrap();

        assert_eq!(analysis.earnings_estimates.current_qtr.avg_estimate, Some(1.5));
        assert!(analysis.earnings_estimates.next_year.is_blank());
        assert_eq!(analysis.analyst_ratings.number_of_analysts, Some(38));
        assert!(analysis.analyst_ratings.ratings.is_empty());
    }

    #[test]
    fn test_technicals_fill_missing_pivots() {
        let mut high = Technicals::default();
        high.pivots.insert(
            "Classic".to_string(),
            PivotLevels {
                p: Some(100.0),
                ..Default::default()
            },
        );

        let mut low = Technicals::default();
        low.pivots.insert(
            "Classic".to_string(),
            PivotLevels {
                p: Some(1.0),
                r1: Some(105.0),
                ..Default::default()
            },
        );
        low.oscillators.push(IndicatorReading {
            name: Some("RSI (14)".to_string()),
            value: Some(Metric::Number(55.0)),
            action: Some("Neutral".to_string()),
        });

        high.fill_missing(&low);

        assert_eq!(high.pivots["Classic"].p, Some(100.0));
        assert_eq!(high.pivots["Classic"].r1, Some(105.0));
        assert_eq!(high.oscillators.len(), 1);
    }

    #[test]
    fn test_insights_parse() {
        let insights: Insights = serde_json::from_str(
            r#"{
                "summary": "Steady",
                "recommendation": {"action": "Hold", "confidence": 62, "reasoning": "Mixed signals"},
                "key_takeaways": ["a", "b", "c"]
            }"#,
        )
        .unwrap();

        assert_eq!(insights.recommendation.action, Action::Hold);
        assert_eq!(insights.visualization_data.price_trend.len(), 0);
    }
}
