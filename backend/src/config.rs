//! Pipeline configuration.
//!
//! Defaults are compiled in; the environment (optionally loaded from a
//! `.env` file by the binary) overrides them, and CLI flags override both.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::logs::LogFormat;

/// Base directory every stage path is resolved against.
pub const DEFAULT_BASE_DIR: &str = ".";

/// Leaderboard length in the report.
pub const DEFAULT_TOP_N: usize = 10;

pub const RAW_FILE: &str = "data/raw/sales_data.csv";
pub const CLEAN_FILE: &str = "data/clean/cleaned_sales_data.csv";
pub const PROCESSED_FILE: &str = "data/processed/transformed_sales_data.csv";
pub const CURATED_DIR: &str = "data/curated";
pub const REPORT_DIR: &str = "reports";

pub const ENV_BASE_DIR: &str = "SALES_ETL_BASE_DIR";
pub const ENV_TOP_N: &str = "SALES_ETL_TOP_N";
pub const ENV_LOG_FORMAT: &str = "SALES_ETL_LOG_FORMAT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub base_dir: PathBuf,
    pub top_n: usize,
    pub log_format: LogFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            top_n: DEFAULT_TOP_N,
            log_format: LogFormat::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `SALES_ETL_*` environment variables.
    ///
    /// Unparseable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            base_dir: lookup(ENV_BASE_DIR)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.base_dir),
            top_n: lookup(ENV_TOP_N)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.top_n),
            log_format: lookup(ENV_LOG_FORMAT)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.log_format),
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn raw_file(&self) -> PathBuf {
        self.base_dir.join(RAW_FILE)
    }

    pub fn clean_file(&self) -> PathBuf {
        self.base_dir.join(CLEAN_FILE)
    }

    pub fn processed_file(&self) -> PathBuf {
        self.base_dir.join(PROCESSED_FILE)
    }

    pub fn curated_dir(&self) -> PathBuf {
        self.base_dir.join(CURATED_DIR)
    }

    pub fn report_dir(&self) -> PathBuf {
        self.base_dir.join(REPORT_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_layout() {
        let config = PipelineConfig::default().with_base_dir("/srv/etl");
        assert_eq!(config.raw_file(), PathBuf::from("/srv/etl/data/raw/sales_data.csv"));
        assert_eq!(config.curated_dir(), PathBuf::from("/srv/etl/data/curated"));
        assert_eq!(config.report_dir(), PathBuf::from("/srv/etl/reports"));
        assert_eq!(config.top_n, 10);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BASE_DIR, "/tmp/sales"),
            (ENV_TOP_N, "5"),
            (ENV_LOG_FORMAT, "json"),
        ]
        .into_iter()
        .collect();
        let config = PipelineConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.base_dir, PathBuf::from("/tmp/sales"));
        assert_eq!(config.top_n, 5);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_bad_env_values_keep_defaults() {
        let config = PipelineConfig::from_lookup(|k| match k {
            ENV_TOP_N => Some("many".to_string()),
            ENV_LOG_FORMAT => Some("yaml".to_string()),
            _ => None,
        });
        assert_eq!(config, PipelineConfig::default());
    }
}
