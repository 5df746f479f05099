//! 대체 레코드 생성기.
//!
//! 모든 소스가 실패했을 때 실제 수집 결과와 같은 형태의 레코드를 만듭니다.
//! 시드를 주면 같은 (시드, 티커, 시각)에 대해 항상 같은 값을 생성합니다.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{debug, instrument};

use edge_core::{
    Action, AnalystRatings, Analysis, BalanceSheet, CashFlowStatement, CompositeRecord,
    EpsEstimate, FinancialHighlights, Fundamental, IncomeStatement, Insights,
    ManagementEffectiveness, Overview, Periods, Profitability, Recommendation, RecordOrigin,
    RevenueEstimate, SignalTally, TechnicalSummary, Technicals, Ticker, TradingInformation,
    TrendPoint, ValuationMeasures, ValuationSnapshot, VisualizationData,
};

/// 과거 날짜 생성 범위 (약 3년).
const MAX_DAYS_BACK: i64 = 1150;

const TAKEAWAYS: [&str; 4] = [
    "Price is trading near key moving averages",
    "Valuation metrics suggest fair pricing",
    "Earnings growth remains stable",
    "Volume trends indicate moderate participation",
];

/// 대체 레코드 생성기.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackGenerator {
    seed: Option<u64>,
}

impl FallbackGenerator {
    /// 호출마다 다른 값을 생성합니다.
    pub fn random() -> Self {
        Self { seed: None }
    }

    /// 결정적 생성기. 티커가 다르면 값도 다릅니다.
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    pub fn generate(&self, ticker: &Ticker, name: Option<String>) -> CompositeRecord {
        self.generate_at(ticker, name, Utc::now())
    }

    /// `as_of` 시점 기준으로 레코드를 생성합니다.
    #[instrument(skip(self, ticker, name), fields(ticker = %ticker))]
    pub fn generate_at(
        &self,
        ticker: &Ticker,
        name: Option<String>,
        as_of: DateTime<Utc>,
    ) -> CompositeRecord {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed_for(seed, ticker)),
            None => StdRng::from_entropy(),
        };
        let mut dice = Dice { rng, as_of };

        let overview = dice.overview();
        let fundamental = dice.fundamental();
        let analysis = dice.analysis();
        let technicals = dice.technicals();
        let insights = dice.insights();

        debug!(price = ?overview.current_price, "Synthetic record generated");

        CompositeRecord {
            ticker: ticker.clone(),
            name,
            last_updated: as_of,
            origin: RecordOrigin::Synthetic,
            overview,
            fundamental,
            analysis,
            technicals,
            insights: Some(insights),
        }
    }
}

/// 시드와 티커를 합친 RNG 시드. 같은 바이너리 안에서만 재현됩니다.
fn seed_for(seed: u64, ticker: &Ticker) -> u64 {
    let mut hasher = DefaultHasher::new();
    (seed, ticker.as_str()).hash(&mut hasher);
    hasher.finish()
}

struct Dice {
    rng: StdRng,
    as_of: DateTime<Utc>,
}

impl Dice {
    /// 소수 둘째 자리까지.
    fn num(&mut self, min: f64, max: f64) -> f64 {
        (self.rng.gen_range(min..max) * 100.0).round() / 100.0
    }

    fn whole(&mut self, min: u32, max: u32) -> u32 {
        self.rng.gen_range(min..=max)
    }

    fn some(&mut self, min: f64, max: f64) -> Option<f64> {
        Some(self.num(min, max))
    }

    fn suffixed(&mut self, min: f64, max: f64, suffix: &str) -> Option<String> {
        Some(format!("{}{}", self.num(min, max), suffix))
    }

    fn range(&mut self, low: (f64, f64), high: (f64, f64)) -> Option<String> {
        Some(format!(
            "{} - {}",
            self.num(low.0, low.1),
            self.num(high.0, high.1)
        ))
    }

    fn date(&mut self) -> Option<String> {
        let days = self.rng.gen_range(0..MAX_DAYS_BACK);
        Some(
            (self.as_of - ChronoDuration::days(days))
                .format("%Y-%m-%d")
                .to_string(),
        )
    }

    fn pick(&mut self, options: &[&str]) -> Option<String> {
        options.choose(&mut self.rng).map(|s| s.to_string())
    }

    fn overview(&mut self) -> Overview {
        let price = self.num(140.0, 200.0);

        Overview {
            current_price: Some(price),
            change: self.some(-3.0, 3.0),
            percent_change: self.suffixed(-2.0, 2.0, "%"),
            previous_close: Some(price - self.num(-2.0, 2.0)),
            open: Some(price - self.num(-1.0, 1.0)),
            bid: Some(price - 0.2),
            ask: Some(price + 0.2),
            day_range: self.range((135.0, 145.0), (195.0, 205.0)),
            fifty_two_week_range: self.range((110.0, 130.0), (210.0, 250.0)),
            volume: Some(format!("{}M", self.whole(10, 80))),
            avg_volume: Some(format!("{}M", self.whole(20, 90))),
            market_cap: Some(format!("{}B", self.whole(500, 3000))),
            beta: self.some(0.8, 1.5),
            pe_ratio: self.some(15.0, 40.0),
            eps: self.some(3.0, 10.0),
            earnings_date: self.date(),
            forward_dividend_yield: self.suffixed(0.5, 2.0, "%"),
            ex_dividend_date: self.date(),
            one_year_target_est: self.some(160.0, 230.0),
        }
    }

    fn fundamental(&mut self) -> Fundamental {
        let current = ValuationSnapshot {
            market_cap: self.some(500.0, 3000.0),
            enterprise_value: self.some(600.0, 3200.0),
            trailing_pe: self.some(15.0, 40.0),
            forward_pe: self.some(12.0, 35.0),
            peg_ratio: self.some(0.8, 2.0),
            price_sales: self.some(3.0, 12.0),
            price_book: self.some(5.0, 25.0),
            enterprise_value_revenue: self.some(3.0, 10.0),
            enterprise_value_ebitda: self.some(8.0, 25.0),
        };

        let financial_highlights = FinancialHighlights {
            fiscal_year_ends: Some("Sep 30".to_string()),
            most_recent_quarter: self.date(),
            profitability: Profitability {
                profit_margin: self.suffixed(15.0, 35.0, "%"),
                operating_margin: self.suffixed(10.0, 30.0, "%"),
            },
            management_effectiveness: ManagementEffectiveness {
                return_on_assets: self.suffixed(5.0, 15.0, "%"),
                return_on_equity: self.suffixed(20.0, 60.0, "%"),
            },
            income_statement: IncomeStatement {
                revenue_ttm: self.suffixed(200.0, 400.0, "B"),
                revenue_per_share_ttm: self.suffixed(10.0, 30.0, ""),
                quarterly_revenue_growth: self.suffixed(2.0, 15.0, "%"),
                gross_profit_ttm: self.suffixed(100.0, 200.0, "B"),
                ebitda: self.suffixed(80.0, 150.0, "B"),
                net_income_ttm: self.suffixed(50.0, 120.0, "B"),
                diluted_eps_ttm: self.suffixed(5.0, 10.0, ""),
                quarterly_earnings_growth: self.suffixed(3.0, 20.0, "%"),
            },
            balance_sheet: BalanceSheet {
                total_cash: self.suffixed(50.0, 150.0, "B"),
                total_cash_per_share: self.suffixed(3.0, 10.0, ""),
                total_debt: self.suffixed(80.0, 200.0, "B"),
                total_debt_equity: self.suffixed(40.0, 150.0, "%"),
                current_ratio: self.suffixed(0.8, 2.0, ""),
                book_value_per_share: self.suffixed(5.0, 20.0, ""),
            },
            cash_flow_statement: CashFlowStatement {
                operating_cash_flow: self.suffixed(80.0, 150.0, "B"),
                levered_free_cash_flow: self.suffixed(50.0, 120.0, "B"),
            },
        };

        let trading_information = TradingInformation {
            beta: self.some(0.8, 1.5).map(Into::into),
            fifty_two_week_change: self.suffixed(-10.0, 30.0, "%"),
            fifty_two_week_high: self.some(200.0, 260.0),
            fifty_two_week_low: self.some(110.0, 150.0),
            fifty_day_moving_average: self.some(150.0, 190.0),
            two_hundred_day_moving_average: self.some(140.0, 180.0),
            avg_vol_3month: self.suffixed(20.0, 80.0, "M"),
            avg_vol_10day: self.suffixed(25.0, 90.0, "M"),
            shares_outstanding: self.suffixed(10.0, 20.0, "B"),
            float: self.suffixed(9.0, 19.0, "B"),
            percent_held_by_insiders: self.suffixed(0.1, 2.0, "%"),
            percent_held_by_institutions: self.suffixed(60.0, 90.0, "%"),
            shares_short: self.suffixed(50.0, 200.0, "M"),
            short_ratio: self.some(1.0, 5.0),
            short_percent_of_float: self.suffixed(0.5, 5.0, "%"),
            short_percent_of_shares_outstanding: self.suffixed(0.5, 4.0, "%"),
            shares_short_prior_month: self.suffixed(40.0, 180.0, "M"),
        };

        Fundamental {
            valuation_measures: ValuationMeasures {
                current,
                history: Default::default(),
            },
            financial_highlights,
            trading_information,
        }
    }

    fn eps(&mut self, avg: (f64, f64), low: (f64, f64), high: (f64, f64), ago: (f64, f64)) -> EpsEstimate {
        EpsEstimate {
            avg_estimate: self.some(avg.0, avg.1),
            low_estimate: self.some(low.0, low.1),
            high_estimate: self.some(high.0, high.1),
            year_ago_eps: self.some(ago.0, ago.1),
        }
    }

    /// `bounds` = (avg, low, high, year ago) 범위(단위 B)와 성장률 범위.
    fn revenue(&mut self, bounds: [(f64, f64); 4], growth: (f64, f64)) -> RevenueEstimate {
        let [avg, low, high, ago] = bounds;
        RevenueEstimate {
            avg_estimate: self.suffixed(avg.0, avg.1, "B"),
            low_estimate: self.suffixed(low.0, low.1, "B"),
            high_estimate: self.suffixed(high.0, high.1, "B"),
            year_ago_sales: self.suffixed(ago.0, ago.1, "B"),
            sales_growth: self.suffixed(growth.0, growth.1, "%"),
        }
    }

    fn analysis(&mut self) -> Analysis {
        let earnings_estimates = Periods {
            current_qtr: self.eps((1.0, 3.0), (0.8, 2.0), (2.0, 4.0), (0.8, 2.0)),
            next_qtr: self.eps((1.2, 3.5), (1.0, 2.5), (2.5, 4.5), (1.0, 2.0)),
            current_year: self.eps((6.0, 10.0), (5.0, 8.0), (8.0, 12.0), (5.0, 9.0)),
            next_year: self.eps((7.0, 12.0), (6.0, 10.0), (9.0, 14.0), (6.0, 10.0)),
        };

        let revenue_estimates = Periods {
            current_qtr: self.revenue(
                [(80.0, 120.0), (70.0, 100.0), (100.0, 140.0), (70.0, 100.0)],
                (2.0, 10.0),
            ),
            next_qtr: self.revenue(
                [(85.0, 130.0), (75.0, 110.0), (110.0, 150.0), (80.0, 110.0)],
                (3.0, 12.0),
            ),
            current_year: self.revenue(
                [(300.0, 420.0), (280.0, 380.0), (350.0, 450.0), (280.0, 380.0)],
                (3.0, 10.0),
            ),
            next_year: self.revenue(
                [(320.0, 450.0), (300.0, 420.0), (380.0, 500.0), (300.0, 420.0)],
                (4.0, 12.0),
            ),
        };

        let analyst_ratings = AnalystRatings {
            current_rating: self.pick(&["Buy", "Hold", "Outperform"]),
            price_target_avg: self.some(170.0, 240.0),
            price_target_low: self.some(150.0, 180.0),
            price_target_high: self.some(220.0, 280.0),
            number_of_analysts: Some(self.whole(20, 45)),
            ratings: Vec::new(),
        };

        Analysis {
            earnings_estimates,
            revenue_estimates,
            earnings_history: Default::default(),
            analyst_ratings,
        }
    }

    fn tally(&mut self) -> SignalTally {
        SignalTally {
            sell: Some(self.whole(1, 5)),
            neutral: Some(self.whole(3, 7)),
            buy: Some(self.whole(2, 6)),
            overall: self.pick(&["Buy", "Neutral", "Sell"]),
        }
    }

    fn technicals(&mut self) -> Technicals {
        Technicals {
            summary: TechnicalSummary {
                oscillators: self.tally(),
                moving_averages: self.tally(),
            },
            ..Default::default()
        }
    }

    fn insights(&mut self) -> Insights {
        let action = [Action::Buy, Action::Sell, Action::Hold]
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Action::Hold);

        let price_trend = (1..=10)
            .map(|day| TrendPoint {
                x: format!("Day {}", day),
                y: self.num(140.0, 200.0),
            })
            .collect();

        Insights {
            summary: "The stock shows balanced momentum with mixed technical and fundamental signals."
                .to_string(),
            recommendation: Recommendation {
                action,
                confidence: f64::from(self.whole(55, 85)),
                reasoning: "This recommendation is based on valuation metrics, recent price behavior, and earnings expectations."
                    .to_string(),
            },
            key_takeaways: TAKEAWAYS.iter().map(|s| s.to_string()).collect(),
            visualization_data: VisualizationData {
                price_trend,
                bullishness_meter: f64::from(self.whole(40, 75)),
                risk_score: f64::from(self.whole(25, 65)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_all_top_level_keys_present() {
        let ticker = Ticker::parse("AAPL").unwrap();
        let record = FallbackGenerator::random().generate(&ticker, Some("Apple".to_string()));

        let json = serde_json::to_value(&record).unwrap();
        for key in ["overview", "fundamental", "analysis", "technicals", "ai_insights"] {
            assert!(!json[key].is_null(), "{} is null", key);
        }
        assert_eq!(json["origin"], "synthetic");
        assert!(record.is_synthetic());
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let ticker = Ticker::parse("MSFT").unwrap();
        let generator = FallbackGenerator::seeded(42);

        let a = generator.generate_at(&ticker, None, as_of());
        let b = generator.generate_at(&ticker, None, as_of());
        assert_eq!(a, b);

        let other = generator.generate_at(&Ticker::parse("NVDA").unwrap(), None, as_of());
        assert_ne!(a.overview, other.overview);

        let reseeded = FallbackGenerator::seeded(43).generate_at(&ticker, None, as_of());
        assert_ne!(a.overview, reseeded.overview);
    }

    #[test]
    fn test_values_within_plausible_ranges() {
        let ticker = Ticker::parse("TSLA").unwrap();
        let record = FallbackGenerator::seeded(7).generate_at(&ticker, None, as_of());

        let price = record.overview.current_price.unwrap();
        assert!((140.0..=200.0).contains(&price));
        assert_eq!(record.overview.bid, Some(price - 0.2));

        let insights = record.insights.unwrap();
        assert_eq!(insights.key_takeaways.len(), 4);
        assert_eq!(insights.visualization_data.price_trend.len(), 10);
        assert_eq!(insights.visualization_data.price_trend[0].x, "Day 1");
        assert!((55.0..=85.0).contains(&insights.recommendation.confidence));

        let earnings_date = record.overview.earnings_date.unwrap();
        assert!(earnings_date.as_str() <= "2024-11-01");
    }

    #[test]
    fn test_synthetic_record_round_trips_through_cache_format() {
        let ticker = Ticker::parse("AMZN").unwrap();
        let record = FallbackGenerator::seeded(1).generate_at(&ticker, None, as_of());

        let json = serde_json::to_string(&record).unwrap();
        let decoded: CompositeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.origin, RecordOrigin::Synthetic);
        assert_eq!(decoded.overview.current_price, record.overview.current_price);
    }
}
