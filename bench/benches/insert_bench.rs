//! Criterion benchmark harness: measures every insert strategy at several
//! record counts, one database file per strategy.
//!
//! Each measured iteration starts from an empty store. The reset runs outside
//! the timed window; the time criterion sees is the elapsed time reported by
//! the runner, so the measurement window matches the standalone binary. The
//! contacts-per-company override is read again before every iteration, so
//! throughput is counted in companies.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crm_bench::config::resolve_contacts_per_company;
use crm_bench::runner::run_strategy;
use crm_bench::store::{self, StoreTarget};
use crm_bench::strategy::StrategyKind;
use std::time::Duration;
use tempfile::TempDir;

/// Record counts to benchmark.
const RECORD_COUNTS: [usize; 2] = [100, 1_000];

fn bench_strategies(c: &mut Criterion) {
    let dir = TempDir::new().expect("Failed to create benchmark directory");
    for kind in StrategyKind::ALL {
        let target = StoreTarget::new(dir.path().join(format!("{}.db", kind.file_stem())));
        store::prepare(&target).expect("Failed to prepare store");

        let mut group = c.benchmark_group(format!("insert/{kind}"));
        group.sample_size(10);
        group.measurement_time(Duration::from_secs(20));

        for records in RECORD_COUNTS {
            group.throughput(Throughput::Elements(records as u64));
            group.bench_with_input(BenchmarkId::from_parameter(records), &records, |b, &records| {
                b.iter_custom(|iters| {
                    let mut total = Duration::ZERO;
                    for _ in 0..iters {
                        store::reset(&target).expect("Failed to reset store");
                        let contacts = resolve_contacts_per_company();
                        let sample = run_strategy(kind, &target, records, contacts)
                            .expect("iteration failed");
                        total += sample.elapsed;
                    }
                    total
                });
            });
        }
        group.finish();
    }
}

criterion_group!(benches, bench_strategies);
criterion_main!(benches);
