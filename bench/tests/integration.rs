//! Integration tests: every strategy against a real database file.

use crm_bench::config::BenchConfig;
use crm_bench::report::check_regression;
use crm_bench::runner::{run_iteration, run_plan, run_strategy, BenchmarkPlan, Iteration};
use crm_bench::store::{self, StoreTarget};
use crm_bench::strategy::StrategyKind;
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;

fn fresh_target(dir: &Path, kind: StrategyKind) -> StoreTarget {
    let target = StoreTarget::new(dir.join(format!("{}.db", kind.file_stem())));
    store::prepare(&target).expect("prepare");
    target
}

fn counts(target: &StoreTarget) -> (u64, u64, u64) {
    let conn = store::connect(target).expect("connect");
    let (companies, contacts) = store::counts(&conn).expect("counts");
    let orphans = store::orphan_contacts(&conn).expect("orphans");
    (companies, contacts, orphans)
}

fn tax_ids(target: &StoreTarget) -> Vec<String> {
    let conn = store::connect(target).expect("connect");
    let mut stmt = conn
        .prepare("SELECT tax_id FROM companies ORDER BY id")
        .expect("prepare");
    let ids = stmt
        .query_map([], |r| r.get(0))
        .expect("query")
        .collect::<Result<Vec<String>, _>>()
        .expect("rows");
    ids
}

fn config_in(dir: &Path, extra: &[(&str, String)]) -> BenchConfig {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert(
        "CRM_BENCH_DATA_DIR".into(),
        dir.to_string_lossy().into_owned(),
    );
    for (k, v) in extra {
        vars.insert(k.to_string(), v.clone());
    }
    BenchConfig::from_lookup(|key| vars.get(key).cloned())
}

// ── Row counts ──────────────────────────────────────────────────────

#[test]
fn every_strategy_writes_n_companies_and_nk_contacts() {
    let dir = TempDir::new().unwrap();
    for kind in StrategyKind::ALL {
        let target = fresh_target(dir.path(), kind);
        let sample = run_strategy(kind, &target, 40, 3).expect("iteration");

        assert_eq!(sample.companies, 40, "{kind}");
        assert_eq!(sample.contacts, 120, "{kind}");
        assert_eq!(counts(&target), (40, 120, 0), "{kind}");
    }
}

#[test]
fn default_contact_count_is_one() {
    let dir = TempDir::new().unwrap();
    for kind in StrategyKind::ALL {
        let target = fresh_target(dir.path(), kind);
        run_strategy(kind, &target, 25, 1).expect("iteration");
        assert_eq!(counts(&target), (25, 25, 0), "{kind}");
    }
}

#[test]
fn zero_records_writes_nothing() {
    let dir = TempDir::new().unwrap();
    for kind in StrategyKind::ALL {
        let target = fresh_target(dir.path(), kind);
        let sample = run_strategy(kind, &target, 0, 1).expect("iteration");
        assert_eq!(sample.rows(), 0, "{kind}");
        assert_eq!(counts(&target), (0, 0, 0), "{kind}");
    }
}

#[test]
fn zero_contacts_writes_companies_only() {
    let dir = TempDir::new().unwrap();
    for kind in StrategyKind::ALL {
        let target = fresh_target(dir.path(), kind);
        run_strategy(kind, &target, 10, 0).expect("iteration");
        assert_eq!(counts(&target), (10, 0, 0), "{kind}");
    }
}

#[test]
fn batched_inserts_the_remainder_chunk() {
    let dir = TempDir::new().unwrap();
    let target = fresh_target(dir.path(), StrategyKind::Batched);
    run_strategy(StrategyKind::Batched, &target, 250, 2).expect("iteration");
    assert_eq!(counts(&target), (250, 500, 0));
}

#[test]
fn batched_fewer_records_than_one_chunk() {
    let dir = TempDir::new().unwrap();
    let target = fresh_target(dir.path(), StrategyKind::Batched);
    run_strategy(StrategyKind::Batched, &target, 7, 1).expect("iteration");
    assert_eq!(counts(&target), (7, 7, 0));
}

#[test]
fn batched_honors_custom_chunk_size() {
    let dir = TempDir::new().unwrap();
    let target = fresh_target(dir.path(), StrategyKind::Batched);
    let iteration = Iteration {
        chunk_size: 3,
        ..Iteration::new(10, 2)
    };
    run_iteration(StrategyKind::Batched, &target, &iteration).expect("iteration");
    assert_eq!(counts(&target), (10, 20, 0));
}

#[test]
fn consecutive_iterations_accumulate_without_orphans() {
    let dir = TempDir::new().unwrap();
    for kind in StrategyKind::ALL {
        let target = fresh_target(dir.path(), kind);
        run_strategy(kind, &target, 15, 2).expect("first");
        run_strategy(kind, &target, 15, 2).expect("second");
        assert_eq!(counts(&target), (30, 60, 0), "{kind}");
    }
}

// ── Reset and reruns ────────────────────────────────────────────────

#[test]
fn rerun_after_reset_has_same_counts_but_new_data() {
    let dir = TempDir::new().unwrap();
    for kind in StrategyKind::ALL {
        let target = fresh_target(dir.path(), kind);

        run_strategy(kind, &target, 20, 2).expect("first run");
        let first = tax_ids(&target);

        store::reset(&target).expect("reset");
        assert_eq!(counts(&target), (0, 0, 0), "{kind}");

        run_strategy(kind, &target, 20, 2).expect("second run");
        let second = tax_ids(&target);

        assert_eq!(counts(&target), (20, 40, 0), "{kind}");
        assert_eq!(first.len(), second.len());
        assert_ne!(first, second, "{kind}: fresh generator per iteration");
    }
}

#[test]
fn seeded_iterations_generate_identical_rows() {
    let dir = TempDir::new().unwrap();
    let a = StoreTarget::new(dir.path().join("a.db"));
    let b = StoreTarget::new(dir.path().join("b.db"));
    store::prepare(&a).unwrap();
    store::prepare(&b).unwrap();

    let iteration = Iteration {
        seed: Some(2024),
        ..Iteration::new(10, 1)
    };
    run_iteration(StrategyKind::DirectSql, &a, &iteration).unwrap();
    run_iteration(StrategyKind::RawCommand, &b, &iteration).unwrap();

    assert_eq!(tax_ids(&a), tax_ids(&b));
}

#[test]
fn generated_tax_ids_are_unformatted_cnpjs() {
    let dir = TempDir::new().unwrap();
    let target = fresh_target(dir.path(), StrategyKind::Mapped);
    run_strategy(StrategyKind::Mapped, &target, 30, 1).unwrap();

    for tax_id in tax_ids(&target) {
        assert_eq!(tax_id.len(), 14);
        assert!(crm_core::fake::is_valid_cnpj(&tax_id), "{tax_id}");
    }
}

#[test]
fn contacts_reference_their_own_company() {
    let dir = TempDir::new().unwrap();
    for kind in StrategyKind::ALL {
        let target = fresh_target(dir.path(), kind);
        run_strategy(kind, &target, 12, 3).unwrap();

        let conn = Connection::open(target.path()).unwrap();
        let per_company: Vec<u32> = conn
            .prepare(
                "SELECT COUNT(c.id) FROM companies p \
                 LEFT JOIN contacts c ON c.company_id = p.id GROUP BY p.id",
            )
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(per_company, vec![3; 12], "{kind}");
    }
}

// ── Plans ───────────────────────────────────────────────────────────

#[test]
fn plan_runs_every_trial_and_resets_first() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path(), &[]);

    // Leftover rows from an earlier run must be truncated by the plan.
    let stale = config.target(StrategyKind::Tracked).unwrap().clone();
    store::prepare(&stale).unwrap();
    run_strategy(StrategyKind::Tracked, &stale, 5, 1).unwrap();

    let plan = BenchmarkPlan {
        record_counts: vec![4],
        trials: 2,
        ..BenchmarkPlan::default()
    };
    let results = run_plan(&plan, &config).expect("plan");

    assert_eq!(results.len(), StrategyKind::ALL.len());
    for result in &results {
        assert_eq!(result.samples.len(), 2, "{}", result.strategy);
        assert_eq!(result.failures, 0, "{}", result.strategy);
        assert!(result.mean_us() >= 0.0);

        let target = config.target(result.strategy).unwrap();
        let (companies, contacts, orphans) = counts(target);
        assert_eq!(companies, 8, "{}", result.strategy);
        assert_eq!(contacts, result.rows as u64 - companies);
        assert_eq!(orphans, 0);
    }
}

#[test]
fn plan_fails_before_running_when_a_target_is_unreachable() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, b"plain file").unwrap();

    let config = config_in(
        dir.path(),
        &[(
            "CRM_BENCH_DB_MAPPED",
            blocker.join("mapped.db").to_string_lossy().into_owned(),
        )],
    );
    let plan = BenchmarkPlan {
        record_counts: vec![3],
        trials: 1,
        ..BenchmarkPlan::default()
    };

    assert!(run_plan(&plan, &config).is_err());

    // Targets listed before the broken one were prepared but never written.
    let tracked = config.target(StrategyKind::Tracked).unwrap();
    assert_eq!(counts(tracked), (0, 0, 0));
}

#[test]
fn batched_is_not_slower_than_tracked_on_real_runs() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path(), &[]);
    let plan = BenchmarkPlan {
        strategies: vec![StrategyKind::Tracked, StrategyKind::Batched],
        record_counts: vec![300],
        trials: 3,
        ..BenchmarkPlan::default()
    };
    let results = run_plan(&plan, &config).expect("plan");

    let verdict = check_regression(&results).expect("both strategies measured");
    assert_eq!(verdict.record_count, 300);
    assert!(
        !verdict.regressed,
        "batched {:.0}us vs tracked {:.0}us ({:.2}x)",
        verdict.batched_mean_us,
        verdict.tracked_mean_us,
        verdict.ratio()
    );
}
