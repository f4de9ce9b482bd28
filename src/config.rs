// ⚙️ Configuration - environment driven, with production defaults

use crate::clustering::DEFAULT_CLUSTER_CUTOFF_HOURS;
use crate::error::{ReconcileError, Result};
use crate::sources::DEFAULT_PAGE_LIMIT;
use chrono::Duration;
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_EXPLORER_URL: &str = "https://explorer2.threefoldtoken.com";
pub const DEFAULT_HORIZON_URL: &str = "https://horizon.stellar.org";
pub const TFT_ISSUER: &str = "GBOVQKJYHXRR3DX6NOX2RRYFRCUMSADGDESTDNBDS6CDVLGVESRTAC47";
pub const TFTA_ISSUER: &str = "GBUT4GP5GJ6B3XW5PXENHQA7TXJI5GOPW3NF4W3ZIW6OOO4ISY6WNLN2";

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub explorer_url: String,
    pub horizon_url: String,
    pub tft_issuer: String,
    pub tfta_issuer: String,
    /// Concurrent explorer fetchers
    pub explorer_workers: usize,
    pub start_height: u64,
    /// Exclusive; None = current chain height + 1
    pub end_height: Option<u64>,
    pub cluster_cutoff_hours: i64,
    pub oracle_concurrency: usize,
    pub page_limit: usize,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            horizon_url: DEFAULT_HORIZON_URL.to_string(),
            tft_issuer: TFT_ISSUER.to_string(),
            tfta_issuer: TFTA_ISSUER.to_string(),
            explorer_workers: 100,
            start_height: 1,
            end_height: None,
            cluster_cutoff_hours: DEFAULT_CLUSTER_CUTOFF_HOURS,
            oracle_concurrency: 8,
            page_limit: DEFAULT_PAGE_LIMIT,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value lookup; unset keys keep their default
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let defaults = Config::default();
        let string = |key: &str, default: String| lookup(key).unwrap_or(default);

        let config = Config {
            explorer_url: string("EXPLORER_URL", defaults.explorer_url),
            horizon_url: string("HORIZON_URL", defaults.horizon_url),
            tft_issuer: string("TFT_ISSUER", defaults.tft_issuer),
            tfta_issuer: string("TFTA_ISSUER", defaults.tfta_issuer),
            explorer_workers: parse_var(&lookup, "EXPLORER_WORKERS")?
                .unwrap_or(defaults.explorer_workers),
            start_height: parse_var(&lookup, "START_HEIGHT")?.unwrap_or(defaults.start_height),
            end_height: parse_var(&lookup, "END_HEIGHT")?,
            cluster_cutoff_hours: parse_var(&lookup, "CLUSTER_CUTOFF_HOURS")?
                .unwrap_or(defaults.cluster_cutoff_hours),
            oracle_concurrency: parse_var(&lookup, "ORACLE_CONCURRENCY")?
                .unwrap_or(defaults.oracle_concurrency),
            page_limit: parse_var(&lookup, "PAGE_LIMIT")?.unwrap_or(defaults.page_limit),
            output_dir: lookup("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.explorer_workers == 0 {
            return Err(ReconcileError::Config("EXPLORER_WORKERS must be at least 1".to_string()));
        }
        if self.cluster_cutoff_hours < 0 {
            return Err(ReconcileError::Config("CLUSTER_CUTOFF_HOURS must not be negative".to_string()));
        }
        self.cluster_cutoff()?;
        if let Some(end) = self.end_height {
            if end < self.start_height {
                return Err(ReconcileError::Config(format!(
                    "END_HEIGHT {} is below START_HEIGHT {}",
                    end, self.start_height
                )));
            }
        }
        Ok(())
    }

    pub fn cluster_cutoff(&self) -> Result<Duration> {
        Duration::try_hours(self.cluster_cutoff_hours).ok_or_else(|| {
            ReconcileError::Config(format!(
                "CLUSTER_CUTOFF_HOURS={} is out of range",
                self.cluster_cutoff_hours
            ))
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ReconcileError::Config(format!("{}={:?}: {}", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.explorer_workers, 100);
        assert_eq!(config.cluster_cutoff().unwrap(), Duration::hours(172));
        assert_eq!(config.end_height, None);
        assert_eq!(config.tft_issuer, TFT_ISSUER);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("EXPLORER_WORKERS", "4"),
            ("END_HEIGHT", "5000"),
            ("CLUSTER_CUTOFF_HOURS", "24"),
            ("OUTPUT_DIR", "/tmp/reports"),
        ]))
        .unwrap();
        assert_eq!(config.explorer_workers, 4);
        assert_eq!(config.end_height, Some(5000));
        assert_eq!(config.cluster_cutoff().unwrap(), Duration::hours(24));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/reports"));
    }

    #[test]
    fn test_malformed_values() {
        let err = Config::from_lookup(lookup(&[("EXPLORER_WORKERS", "many")])).unwrap_err();
        assert!(err.to_string().contains("EXPLORER_WORKERS"));

        assert!(Config::from_lookup(lookup(&[("EXPLORER_WORKERS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("START_HEIGHT", "10"), ("END_HEIGHT", "5")])).is_err());
    }

    #[test]
    fn test_cutoff_beyond_duration_range_is_rejected() {
        let err = Config::from_lookup(lookup(&[("CLUSTER_CUTOFF_HOURS", "9000000000000")])).unwrap_err();
        assert!(matches!(err, ReconcileError::Config(_)));
        assert!(err.to_string().contains("CLUSTER_CUTOFF_HOURS"));

        // Largest cutoffs that still fit are accepted
        let config = Config::from_lookup(lookup(&[("CLUSTER_CUTOFF_HOURS", "1000000000")])).unwrap();
        assert_eq!(config.cluster_cutoff().unwrap(), Duration::hours(1_000_000_000));
    }
}
