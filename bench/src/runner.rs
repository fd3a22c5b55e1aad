//! Benchmark runner: drives one [`Inserter`] through
//! `Setup → Generate → Insert[→ commit | → abort] → Teardown` and times it.
//!
//! With the default [`MeasurementWindow::InsertOnly`] the clock covers
//! Generate and Insert only. The tracked and batched strategies check their
//! sessions out inside `insert_batch`, so their connection checkout is timed
//! while the single-connection strategies open theirs in `setup`.
//! [`MeasurementWindow::Unified`] times Setup through Teardown for everyone.

use crate::config::{
    resolve_contacts_per_company, BenchConfig, DEFAULT_RECORD_COUNT, DEFAULT_TRIALS,
};
use crate::records::SyntheticRecords;
use crate::report::StrategyResult;
use crate::store::{self, StoreTarget};
use crate::strategy::batched::DEFAULT_CHUNK_SIZE;
use crate::strategy::{
    BatchedInserter, DirectSqlInserter, Inserter, MappedInserter, RawCommandInserter, StrategyKind,
    TrackedInserter,
};
use anyhow::{Context as _, Result};
use crm_core::fake::Faker;
use log::{debug, info, warn};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementWindow {
    #[default]
    InsertOnly,
    Unified,
}

impl MeasurementWindow {
    pub fn name(self) -> &'static str {
        match self {
            MeasurementWindow::InsertOnly => "insert-only",
            MeasurementWindow::Unified => "unified",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace('_', "-").as_str() {
            "insert-only" | "insert" => Some(MeasurementWindow::InsertOnly),
            "unified" | "full" => Some(MeasurementWindow::Unified),
            _ => None,
        }
    }
}

impl fmt::Display for MeasurementWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MeasurementWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| anyhow::anyhow!("unknown measurement window '{s}'"))
    }
}

/// Parameters of a single timed iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iteration {
    pub record_count: usize,
    pub contacts_per_company: usize,
    pub window: MeasurementWindow,
    /// Fixed generator seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub chunk_size: usize,
}

impl Iteration {
    pub fn new(record_count: usize, contacts_per_company: usize) -> Self {
        Self {
            record_count,
            contacts_per_company,
            window: MeasurementWindow::default(),
            seed: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Outcome of one successful iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub strategy: StrategyKind,
    pub record_count: usize,
    pub contacts_per_company: usize,
    pub companies: usize,
    pub contacts: usize,
    pub elapsed: Duration,
    pub window: MeasurementWindow,
    /// Whether connection/session acquisition fell inside `elapsed`.
    pub context_in_window: bool,
}

impl Sample {
    pub fn rows(&self) -> usize {
        self.companies + self.contacts
    }

    pub fn rows_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.rows() as f64 / secs
    }
}

/// Run one iteration with default window, entropy seed and chunk size.
pub fn run_strategy(
    kind: StrategyKind,
    target: &StoreTarget,
    record_count: usize,
    contacts_per_company: usize,
) -> Result<Sample> {
    run_iteration(kind, target, &Iteration::new(record_count, contacts_per_company))
}

pub fn run_iteration(
    kind: StrategyKind,
    target: &StoreTarget,
    iteration: &Iteration,
) -> Result<Sample> {
    match kind {
        StrategyKind::Tracked => measure(&TrackedInserter, target, iteration),
        StrategyKind::Batched => measure(
            &BatchedInserter::with_chunk_size(iteration.chunk_size),
            target,
            iteration,
        ),
        StrategyKind::DirectSql => measure(&DirectSqlInserter::default(), target, iteration),
        StrategyKind::Mapped => measure(&MappedInserter::default(), target, iteration),
        StrategyKind::RawCommand => measure(&RawCommandInserter::default(), target, iteration),
    }
}

fn measure<I: Inserter>(
    inserter: &I,
    target: &StoreTarget,
    iteration: &Iteration,
) -> Result<Sample> {
    let kind = inserter.kind();
    let started = Instant::now();

    let mut ctx = inserter
        .setup(target)
        .with_context(|| format!("{kind}: setup against {target}"))?;
    let mut faker = match iteration.seed {
        Some(seed) => Faker::seeded(seed),
        None => Faker::from_entropy(),
    };

    let insert_started = Instant::now();
    let records = SyntheticRecords::new(
        &mut faker,
        iteration.record_count,
        iteration.contacts_per_company,
    );
    let inserted = inserter.insert_batch(&mut ctx, records);
    let insert_elapsed = insert_started.elapsed();

    // Teardown runs whether or not the insert committed.
    let torn_down = inserter.teardown(ctx);
    let total_elapsed = started.elapsed();

    let stats = inserted?;
    torn_down.with_context(|| format!("{kind}: teardown"))?;

    let (elapsed, context_in_window) = match iteration.window {
        MeasurementWindow::InsertOnly => (insert_elapsed, kind.acquires_context_in_window()),
        MeasurementWindow::Unified => (total_elapsed, true),
    };

    Ok(Sample {
        strategy: kind,
        record_count: iteration.record_count,
        contacts_per_company: iteration.contacts_per_company,
        companies: stats.companies,
        contacts: stats.contacts,
        elapsed,
        window: iteration.window,
        context_in_window,
    })
}

/// What the binary runs: every strategy at every record count, `trials` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkPlan {
    pub strategies: Vec<StrategyKind>,
    pub record_counts: Vec<usize>,
    pub trials: usize,
    pub window: MeasurementWindow,
    pub chunk_size: usize,
}

impl Default for BenchmarkPlan {
    fn default() -> Self {
        Self {
            strategies: StrategyKind::ALL.to_vec(),
            record_counts: vec![DEFAULT_RECORD_COUNT],
            trials: DEFAULT_TRIALS,
            window: MeasurementWindow::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Prepare and reset every target, then run the trials sequentially.
///
/// A target that cannot be prepared fails the whole plan before anything is
/// timed. A failing iteration only counts against its [`StrategyResult`].
pub fn run_plan(plan: &BenchmarkPlan, config: &BenchConfig) -> Result<Vec<StrategyResult>> {
    info!(
        "Benchmark plan: {} strategies, record counts {:?}, {} trials, {} window",
        plan.strategies.len(),
        plan.record_counts,
        plan.trials,
        plan.window
    );

    let mut targets = Vec::with_capacity(plan.strategies.len());
    for &kind in &plan.strategies {
        let target = config
            .target(kind)
            .with_context(|| format!("no store target configured for {kind}"))?
            .clone();
        store::prepare(&target).with_context(|| format!("{kind}: preparing {target}"))?;
        store::reset(&target).with_context(|| format!("{kind}: resetting {target}"))?;
        info!("{kind}: reset {target}");
        targets.push((kind, target));
    }

    let mut results = Vec::with_capacity(targets.len() * plan.record_counts.len());
    for (kind, target) in &targets {
        for &record_count in &plan.record_counts {
            let mut result = StrategyResult::new(*kind, record_count);

            for trial in 1..=plan.trials {
                let iteration = Iteration {
                    record_count,
                    contacts_per_company: resolve_contacts_per_company(),
                    window: plan.window,
                    seed: None,
                    chunk_size: plan.chunk_size,
                };

                match run_iteration(*kind, target, &iteration) {
                    Ok(sample) => {
                        debug!(
                            "{kind} trial {trial}/{}: {} rows in {:?} ({:.0} rows/s)",
                            plan.trials,
                            sample.rows(),
                            sample.elapsed,
                            sample.rows_per_sec()
                        );
                        result.add_sample(&sample);
                    }
                    Err(err) => {
                        warn!(
                            "{kind} trial {trial}/{} with {record_count} records failed: {err:#}",
                            plan.trials
                        );
                        result.add_failure();
                    }
                }
            }

            results.push(result);
        }
    }

    Ok(results)
}
