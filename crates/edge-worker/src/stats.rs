//! 워커 처리 통계.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use edge_core::JobOutcome;

/// 결과별 누적 카운터.
#[derive(Debug, Default)]
pub struct WorkerStats {
    fresh: AtomicU64,
    synthetic: AtomicU64,
    cached: AtomicU64,
    locked: AtomicU64,
    failed: AtomicU64,
}

/// 통계 스냅샷.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkerStatsSnapshot {
    pub total: u64,
    pub fresh: u64,
    pub synthetic: u64,
    pub cached: u64,
    pub locked: u64,
    pub failed: u64,
}

impl WorkerStatsSnapshot {
    /// 실패를 제외한 비율 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            ((self.total - self.failed) as f64 / self.total as f64) * 100.0
        }
    }
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: JobOutcome) {
        let counter = match outcome {
            JobOutcome::Fresh => &self.fresh,
            JobOutcome::Synthetic => &self.synthetic,
            JobOutcome::Cached => &self.cached,
            JobOutcome::Locked => &self.locked,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        let fresh = self.fresh.load(Ordering::Relaxed);
        let synthetic = self.synthetic.load(Ordering::Relaxed);
        let cached = self.cached.load(Ordering::Relaxed);
        let locked = self.locked.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);

        WorkerStatsSnapshot {
            total: fresh + synthetic + cached + locked + failed,
            fresh,
            synthetic,
            cached,
            locked,
            failed,
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        let s = self.snapshot();
        tracing::info!(
            total = s.total,
            fresh = s.fresh,
            synthetic = s.synthetic,
            cached = s.cached,
            locked = s.locked,
            failed = s.failed,
            success_rate = format!("{:.1}%", s.success_rate()),
            "Worker summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_totals() {
        let stats = WorkerStats::new();
        stats.record(JobOutcome::Fresh);
        stats.record(JobOutcome::Cached);
        stats.record(JobOutcome::Cached);
        stats.record_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.cached, 2);
        assert_eq!(snapshot.success_rate(), 75.0);
    }
}
