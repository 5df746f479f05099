//! 소스 우선순위 병합.
//!
//! 섹션마다 소스 순서를 고정해 두고, 필드 단위로 앞선 소스의 값이 비어 있을 때만
//! 다음 소스의 값을 사용합니다.

use chrono::{DateTime, Utc};

use edge_core::{CompositeRecord, FillMissing, RecordOrigin, Ticker};

use crate::scraper::{PartialRecord, SourceKind, SourceResult};

/// 섹션별 소스 우선순위.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePriority {
    pub overview: &'static [SourceKind],
    pub fundamental: &'static [SourceKind],
    pub analysis: &'static [SourceKind],
    pub technicals: &'static [SourceKind],
}

/// 기본 우선순위 표.
///
/// - overview: overview 페이지 → key statistics → analysis
/// - fundamental: key statistics → overview (beta, trailing P/E만 기여)
/// - analysis: analysis → overview (목표가 평균만 기여, 등급 목록과 날짜는 analysis 단독)
/// - technicals: technicals 단독
pub const MERGE_PRIORITY: MergePriority = MergePriority {
    overview: &[SourceKind::Overview, SourceKind::Fundamental, SourceKind::Analysis],
    fundamental: &[SourceKind::Fundamental, SourceKind::Overview],
    analysis: &[SourceKind::Analysis, SourceKind::Overview],
    technicals: &[SourceKind::Technicals],
};

impl Default for MergePriority {
    fn default() -> Self {
        MERGE_PRIORITY
    }
}

impl MergePriority {
    /// 성공한 소스 결과를 하나의 레코드로 병합합니다.
    ///
    /// 실패한 소스나 기여가 없는 섹션은 빈 필드로 남고, 레코드 형태는 항상 유지됩니다.
    pub fn merge(
        &self,
        ticker: &Ticker,
        name: Option<String>,
        results: &[SourceResult],
        now: DateTime<Utc>,
    ) -> CompositeRecord {
        let mut record = CompositeRecord::empty(ticker.clone(), name, now);
        record.origin = RecordOrigin::Live;

        fill_section(&mut record.overview, self.overview, results, |p| p.overview.as_ref());
        fill_section(&mut record.fundamental, self.fundamental, results, |p| {
            p.fundamental.as_ref()
        });
        fill_section(&mut record.analysis, self.analysis, results, |p| p.analysis.as_ref());
        fill_section(&mut record.technicals, self.technicals, results, |p| {
            p.technicals.as_ref()
        });

        record
    }
}

fn fill_section<T, F>(target: &mut T, order: &[SourceKind], results: &[SourceResult], pick: F)
where
    T: FillMissing,
    F: Fn(&PartialRecord) -> Option<&T>,
{
    for source in order {
        let contribution = results
            .iter()
            .filter(|r| r.source() == *source)
            .find_map(|r| r.record().and_then(&pick));

        if let Some(section) = contribution {
            target.fill_missing(section);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_core::{AnalystRating, Analysis, Fundamental, Overview, Technicals};

    fn ticker() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    fn success(source: SourceKind, record: PartialRecord) -> SourceResult {
        SourceResult::Success { source, record }
    }

    fn failed(source: SourceKind) -> SourceResult {
        SourceResult::Failed {
            source,
            reason: "boom".to_string(),
        }
    }

    fn overview_with_beta(beta: Option<f64>, price: Option<f64>) -> PartialRecord {
        PartialRecord {
            overview: Some(Overview {
                beta,
                current_price: price,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_higher_priority_wins() {
        let results = vec![
            success(SourceKind::Fundamental, overview_with_beta(Some(2.0), Some(99.0))),
            success(SourceKind::Overview, overview_with_beta(Some(1.2), None)),
        ];

        let record = MERGE_PRIORITY.merge(&ticker(), None, &results, Utc::now());

        assert_eq!(record.overview.beta, Some(1.2));
        // overview가 비운 필드는 다음 소스에서 채움
        assert_eq!(record.overview.current_price, Some(99.0));
    }

    #[test]
    fn test_falls_through_when_high_priority_failed() {
        let results = vec![
            failed(SourceKind::Overview),
            success(SourceKind::Fundamental, overview_with_beta(Some(2.0), None)),
        ];

        let record = MERGE_PRIORITY.merge(&ticker(), None, &results, Utc::now());
        assert_eq!(record.overview.beta, Some(2.0));
    }

    #[test]
    fn test_placeholder_counts_as_empty() {
        let high = PartialRecord {
            overview: Some(Overview {
                market_cap: Some("N/A".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let low = PartialRecord {
            overview: Some(Overview {
                market_cap: Some("3.1T".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let record = MERGE_PRIORITY.merge(
            &ticker(),
            None,
            &[success(SourceKind::Overview, high), success(SourceKind::Fundamental, low)],
            Utc::now(),
        );
        assert_eq!(record.overview.market_cap.as_deref(), Some("3.1T"));
    }

    #[test]
    fn test_ratings_come_from_analysis_only() {
        let mut from_overview = Analysis::default();
        from_overview.analyst_ratings.price_target_avg = Some(230.0);

        let mut from_analysis = Analysis::default();
        from_analysis.analyst_ratings.current_rating = Some("Buy".to_string());
        from_analysis.analyst_ratings.ratings.push(AnalystRating {
            firm: Some("Morgan Stanley".to_string()),
            ..Default::default()
        });

        let results = vec![
            success(
                SourceKind::Overview,
                PartialRecord {
                    analysis: Some(from_overview),
                    ..Default::default()
                },
            ),
            success(
                SourceKind::Analysis,
                PartialRecord {
                    analysis: Some(from_analysis),
                    ..Default::default()
                },
            ),
        ];

        let record = MERGE_PRIORITY.merge(&ticker(), None, &results, Utc::now());
        let ratings = &record.analysis.analyst_ratings;
        assert_eq!(ratings.current_rating.as_deref(), Some("Buy"));
        assert_eq!(ratings.price_target_avg, Some(230.0));
        assert_eq!(ratings.ratings.len(), 1);
    }

    #[test]
    fn test_single_success_leaves_other_sections_empty() {
        let results = vec![
            failed(SourceKind::Overview),
            failed(SourceKind::Fundamental),
            failed(SourceKind::Analysis),
            success(
                SourceKind::Technicals,
                PartialRecord {
                    technicals: Some(Technicals {
                        oscillators: vec![Default::default()],
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ),
        ];

        let record = MERGE_PRIORITY.merge(&ticker(), None, &results, Utc::now());
        assert_eq!(record.technicals.oscillators.len(), 1);
        assert_eq!(record.overview, Overview::default());
        assert_eq!(record.fundamental, Fundamental::default());
        assert_eq!(record.origin, RecordOrigin::Live);
    }
}
