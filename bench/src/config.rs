//! Environment-driven configuration.
//!
//! Every setting has a default; a value that does not parse falls back to it
//! and leaves a note in [`BenchConfig::warnings`] so the binary can log it
//! once the logger is up. The contacts-per-company override is the exception:
//! it is read again at every iteration and falls back silently.

use crate::runner::{BenchmarkPlan, MeasurementWindow};
use crate::store::StoreTarget;
use crate::strategy::batched::DEFAULT_CHUNK_SIZE;
use crate::strategy::StrategyKind;
use log::LevelFilter;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "bench-data";
pub const DEFAULT_RECORD_COUNT: usize = 10_000;
pub const DEFAULT_TRIALS: usize = 5;
pub const DEFAULT_LOG_FILE: &str = "crm-bench.log";
pub const DEFAULT_CONTACTS_PER_COMPANY: usize = 1;

pub const CONTACTS_PER_COMPANY_VAR: &str = "CRM_BENCH_CONTACTS_PER_COMPANY";

#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub data_dir: PathBuf,
    pub targets: BTreeMap<StrategyKind, StoreTarget>,
    pub strategies: Vec<StrategyKind>,
    pub record_counts: Vec<usize>,
    pub trials: usize,
    pub window: MeasurementWindow,
    pub chunk_size: usize,
    pub log_level: LevelFilter,
    pub log_file: Option<String>,
    pub warnings: Vec<String>,
}

impl BenchConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve every setting through `lookup` (a variable name to value map).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let data_dir = PathBuf::from(
            value("CRM_BENCH_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        );

        let targets = StrategyKind::ALL
            .into_iter()
            .map(|kind| {
                let var = format!("CRM_BENCH_DB_{}", kind.file_stem().to_uppercase());
                let path = value(&var)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| data_dir.join(format!("{}.db", kind.file_stem())));
                (kind, StoreTarget::new(path))
            })
            .collect();

        let strategies = match value("CRM_BENCH_STRATEGIES") {
            Some(raw) => match parse_list::<StrategyKind>(&raw) {
                Some(list) if !list.is_empty() => list,
                _ => {
                    warnings.push(format!(
                        "CRM_BENCH_STRATEGIES='{raw}' is invalid, running all strategies"
                    ));
                    StrategyKind::ALL.to_vec()
                }
            },
            None => StrategyKind::ALL.to_vec(),
        };

        let record_counts = match value("CRM_BENCH_RECORDS") {
            Some(raw) => match parse_list::<usize>(&raw) {
                Some(list) if !list.is_empty() => list,
                _ => {
                    warnings.push(format!(
                        "CRM_BENCH_RECORDS='{raw}' is invalid, using {DEFAULT_RECORD_COUNT}"
                    ));
                    vec![DEFAULT_RECORD_COUNT]
                }
            },
            None => vec![DEFAULT_RECORD_COUNT],
        };

        let trials = parse_or(
            value("CRM_BENCH_TRIALS"),
            "CRM_BENCH_TRIALS",
            DEFAULT_TRIALS,
            &mut warnings,
        )
        .max(1);

        let chunk_size = parse_or(
            value("CRM_BENCH_CHUNK_SIZE"),
            "CRM_BENCH_CHUNK_SIZE",
            DEFAULT_CHUNK_SIZE,
            &mut warnings,
        )
        .max(1);

        let window = match value("CRM_BENCH_WINDOW") {
            Some(raw) => MeasurementWindow::parse(&raw).unwrap_or_else(|| {
                warnings.push(format!("CRM_BENCH_WINDOW='{raw}' is invalid, using insert-only"));
                MeasurementWindow::default()
            }),
            None => MeasurementWindow::default(),
        };

        let log_level = match value("CRM_BENCH_LOG_LEVEL") {
            Some(raw) => crm_core::parse_log_level(&raw).unwrap_or_else(|| {
                warnings.push(format!("CRM_BENCH_LOG_LEVEL='{raw}' is invalid, using info"));
                LevelFilter::Info
            }),
            None => LevelFilter::Info,
        };

        let log_file = match lookup("CRM_BENCH_LOG_FILE") {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            None => Some(DEFAULT_LOG_FILE.to_string()),
        };

        Self {
            data_dir,
            targets,
            strategies,
            record_counts,
            trials,
            window,
            chunk_size,
            log_level,
            log_file,
            warnings,
        }
    }

    pub fn target(&self, kind: StrategyKind) -> Option<&StoreTarget> {
        self.targets.get(&kind)
    }

    pub fn plan(&self) -> BenchmarkPlan {
        BenchmarkPlan {
            strategies: self.strategies.clone(),
            record_counts: self.record_counts.clone(),
            trials: self.trials,
            window: self.window,
            chunk_size: self.chunk_size,
        }
    }
}

fn parse_list<T: std::str::FromStr>(raw: &str) -> Option<Vec<T>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

fn parse_or(raw: Option<String>, key: &str, default: usize, warnings: &mut Vec<String>) -> usize {
    match raw {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warnings.push(format!("{key}='{raw}' is invalid, using {default}"));
            default
        }),
        None => default,
    }
}

/// Contacts per company from a raw override value. Unset, blank or anything
/// that is not a non-negative integer yields the default of 1.
pub fn parse_contacts_per_company(raw: Option<&str>) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_CONTACTS_PER_COMPANY)
}

/// Read the contacts-per-company override from the process environment.
pub fn resolve_contacts_per_company() -> usize {
    parse_contacts_per_company(env::var(CONTACTS_PER_COMPANY_VAR).ok().as_deref())
}
