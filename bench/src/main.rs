//! Standalone benchmark runner that prints the formatted report.
//!
//! Settings come from `CRM_BENCH_*` environment variables, optionally read
//! from a `.env` file in the working directory. Exits non-zero when the plan
//! cannot start or the batched strategy regresses against the tracked one.
//!
//! Usage:
//!   cargo run --release
//!   CRM_BENCH_RECORDS=100,1000 CRM_BENCH_STRATEGIES=batched,tracked cargo run --release

use crm_bench::config::BenchConfig;
use crm_bench::report::{check_regression, print_report};
use crm_bench::runner::run_plan;
use std::process;

fn main() {
    let dotenv = dotenvy::dotenv();
    let config = BenchConfig::from_env();

    crm_core::initialize_logger(config.log_level, config.log_file.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to initialize logger: {}. Exiting.", e);
        process::exit(1);
    });

    log::info!(
        "crm-bench starting (level={}, logfile={}, data dir={})",
        config.log_level,
        config.log_file.as_deref().unwrap_or("none"),
        config.data_dir.display()
    );
    if let Ok(path) = dotenv {
        log::info!("Loaded environment from {}", path.display());
    }
    for warning in &config.warnings {
        log::warn!("{warning}");
    }

    let plan = config.plan();
    let results = match run_plan(&plan, &config) {
        Ok(results) => results,
        Err(err) => {
            log::error!("Benchmark could not start: {err:#}");
            process::exit(1);
        }
    };

    print_report(&results);

    if let Some(verdict) = check_regression(&results) {
        if verdict.regressed {
            log::error!(
                "batched strategy is {:.2}x slower than tracked at {} records",
                verdict.ratio(),
                verdict.record_count
            );
            process::exit(2);
        }
    }
}
