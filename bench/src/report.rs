//! Report module: aggregates samples per strategy and prints the comparison.

use crate::runner::Sample;
use crate::strategy::StrategyKind;
use std::time::Duration;

/// The batched strategy regresses when its mean exceeds the tracked mean by
/// more than this factor.
pub const BATCHED_REGRESSION_FACTOR: f64 = 1.25;

/// All trials of one strategy at one record count.
#[derive(Debug, Clone)]
pub struct StrategyResult {
    pub strategy: StrategyKind,
    pub record_count: usize,
    pub contacts_per_company: usize,
    pub samples: Vec<Duration>,
    pub failures: usize,
    /// Rows written across all successful samples.
    pub rows: usize,
}

impl StrategyResult {
    pub fn new(strategy: StrategyKind, record_count: usize) -> Self {
        Self {
            strategy,
            record_count,
            contacts_per_company: 0,
            samples: Vec::new(),
            failures: 0,
            rows: 0,
        }
    }

    pub fn add_sample(&mut self, sample: &Sample) {
        self.samples.push(sample.elapsed);
        self.rows += sample.rows();
        self.contacts_per_company = sample.contacts_per_company;
    }

    pub fn add_failure(&mut self) {
        self.failures += 1;
    }

    pub fn trials(&self) -> usize {
        self.samples.len() + self.failures
    }

    pub fn mean_us(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|d| d.as_secs_f64() * 1e6).sum();
        sum / self.samples.len() as f64
    }

    pub fn percentile_us(&self, pct: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.samples.iter().map(|d| d.as_secs_f64() * 1e6).collect();
        sorted.sort_by(f64::total_cmp);
        let idx = ((pct / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    pub fn rows_per_sec(&self) -> f64 {
        let secs: f64 = self.samples.iter().map(Duration::as_secs_f64).sum();
        if secs <= 0.0 {
            return 0.0;
        }
        self.rows as f64 / secs
    }
}

/// Batched vs tracked comparison at one record count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionVerdict {
    pub record_count: usize,
    pub tracked_mean_us: f64,
    pub batched_mean_us: f64,
    pub regressed: bool,
}

impl RegressionVerdict {
    pub fn ratio(&self) -> f64 {
        if self.tracked_mean_us <= 0.0 {
            return 0.0;
        }
        self.batched_mean_us / self.tracked_mean_us
    }
}

/// Compare batched against tracked at the largest record count both ran
/// successfully. `None` when either strategy has no samples there.
pub fn check_regression(results: &[StrategyResult]) -> Option<RegressionVerdict> {
    let measured = |kind: StrategyKind, count: usize| {
        results
            .iter()
            .find(|r| r.strategy == kind && r.record_count == count && !r.samples.is_empty())
    };

    let record_count = results
        .iter()
        .filter(|r| r.strategy == StrategyKind::Batched && !r.samples.is_empty())
        .map(|r| r.record_count)
        .filter(|&count| measured(StrategyKind::Tracked, count).is_some())
        .max()?;

    let tracked = measured(StrategyKind::Tracked, record_count)?.mean_us();
    let batched = measured(StrategyKind::Batched, record_count)?.mean_us();

    Some(RegressionVerdict {
        record_count,
        tracked_mean_us: tracked,
        batched_mean_us: batched,
        regressed: batched > tracked * BATCHED_REGRESSION_FACTOR,
    })
}

/// Print a formatted report comparing strategy results.
pub fn print_report(results: &[StrategyResult]) {
    println!("\n{}", "=".repeat(80));
    println!("  CRM Insert Benchmark Report");
    println!("{}", "=".repeat(80));

    for result in results {
        let mean = result.mean_us();

        println!(
            "\n  Strategy: {} | Records: {} | Contacts/company: {}",
            result.strategy, result.record_count, result.contacts_per_company
        );
        println!("  {}", "-".repeat(60));
        println!(
            "  Trials:          {:>10}  ({} failed)",
            result.trials(),
            result.failures
        );
        if result.samples.is_empty() {
            println!("  No successful samples.");
            continue;
        }
        println!("  Mean:            {:>10.0}µs  ({:.2}ms)", mean, mean / 1000.0);
        println!("  p50:             {:>10.0}µs", result.percentile_us(50.0));
        println!("  p95:             {:>10.0}µs", result.percentile_us(95.0));
        println!("  Throughput:      {:>10.0} rows/s", result.rows_per_sec());
    }

    println!("\n{}", "=".repeat(80));

    if results.len() >= 2 {
        println!("\n  Comparison Summary:");
        println!(
            "  {:24} {:>12} {:>12} {:>12} {:>7}",
            "Strategy / Records", "Mean (µs)", "p95 (µs)", "Rows/s", "Failed"
        );
        println!("  {}", "-".repeat(71));
        for r in results {
            let label = format!("{}/{}", r.strategy, r.record_count);
            println!(
                "  {:24} {:>12.0} {:>12.0} {:>12.0} {:>7}",
                label,
                r.mean_us(),
                r.percentile_us(95.0),
                r.rows_per_sec(),
                r.failures
            );
        }
    }

    if let Some(verdict) = check_regression(results) {
        println!(
            "\n  Batched vs tracked at {} records: {:.2}x ({})",
            verdict.record_count,
            verdict.ratio(),
            if verdict.regressed { "REGRESSED" } else { "OK" }
        );
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::MeasurementWindow;

    fn sample(strategy: StrategyKind, millis: u64) -> Sample {
        Sample {
            strategy,
            record_count: 10,
            contacts_per_company: 1,
            companies: 10,
            contacts: 10,
            elapsed: Duration::from_millis(millis),
            window: MeasurementWindow::InsertOnly,
            context_in_window: false,
        }
    }

    fn result(strategy: StrategyKind, millis: &[u64]) -> StrategyResult {
        let mut result = StrategyResult::new(strategy, 10);
        for &ms in millis {
            result.add_sample(&sample(strategy, ms));
        }
        result
    }

    #[test]
    fn statistics_over_samples() {
        let r = result(StrategyKind::Mapped, &[40, 10, 30, 20, 50]);
        assert!((r.mean_us() - 30_000.0).abs() < 1e-6);
        assert!((r.percentile_us(50.0) - 30_000.0).abs() < 1e-6);
        assert!((r.percentile_us(100.0) - 50_000.0).abs() < 1e-6);
        assert!((r.percentile_us(0.0) - 10_000.0).abs() < 1e-6);
        // 100 rows in 150ms
        assert!((r.rows_per_sec() - 100.0 / 0.150).abs() < 1e-6);
    }

    #[test]
    fn empty_result_is_all_zero() {
        let mut r = StrategyResult::new(StrategyKind::Tracked, 10);
        r.add_failure();
        assert_eq!(r.mean_us(), 0.0);
        assert_eq!(r.percentile_us(95.0), 0.0);
        assert_eq!(r.rows_per_sec(), 0.0);
        assert_eq!(r.trials(), 1);
    }

    #[test]
    fn batched_within_factor_passes() {
        let results = [
            result(StrategyKind::Tracked, &[100, 100]),
            result(StrategyKind::Batched, &[120, 120]),
        ];
        let verdict = check_regression(&results).unwrap();
        assert!(!verdict.regressed);
        assert!((verdict.ratio() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn batched_beyond_factor_regresses() {
        let results = [
            result(StrategyKind::Tracked, &[100]),
            result(StrategyKind::Batched, &[130]),
        ];
        assert!(check_regression(&results).unwrap().regressed);
    }

    #[test]
    fn no_verdict_without_both_strategies() {
        let results = [result(StrategyKind::Batched, &[10])];
        assert!(check_regression(&results).is_none());

        let mut failed = StrategyResult::new(StrategyKind::Tracked, 10);
        failed.add_failure();
        let results = [failed, result(StrategyKind::Batched, &[10])];
        assert!(check_regression(&results).is_none());
    }
}
