//! Importer configuration.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BASE_FOLDER: &str = "./releases";
const DEFAULT_PORT: u16 = 50061;
const DEFAULT_SNOMED_CHUNK_SIZE: usize = 1000;
const DEFAULT_LOINC_CHUNK_SIZE: usize = 100;
const DEFAULT_RETENTION_HOURS: u64 = 24 * 7;

/// Runtime settings of the importer service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImporterConfig {
    /// Root folder holding `snomed/` and `loinc/` releases.
    pub base_folder: PathBuf,
    /// gRPC listen port.
    pub port: u16,
    /// Updates per upload chunk for SNOMED CT jobs.
    pub snomed_chunk_size: usize,
    /// Updates per upload chunk for LOINC jobs.
    pub loinc_chunk_size: usize,
    /// Page size of range queries; 0 uses the chunk size.
    pub page_limit: usize,
    /// How long finished and running processes stay in the registry.
    pub retention: Duration,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            base_folder: PathBuf::from(DEFAULT_BASE_FOLDER),
            port: DEFAULT_PORT,
            snomed_chunk_size: DEFAULT_SNOMED_CHUNK_SIZE,
            loinc_chunk_size: DEFAULT_LOINC_CHUNK_SIZE,
            page_limit: 0,
            retention: Duration::from_secs(DEFAULT_RETENTION_HOURS * 3600),
        }
    }
}

impl ImporterConfig {
    /// Reads the configuration from `IMPORTER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let retention_hours = parse_or(&lookup, "IMPORTER_RETENTION_HOURS", DEFAULT_RETENTION_HOURS);

        Self {
            base_folder: lookup("IMPORTER_BASE_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.base_folder),
            port: parse_or(&lookup, "IMPORTER_PORT", defaults.port),
            snomed_chunk_size: positive_or(&lookup, "IMPORTER_SNOMED_CHUNK_SIZE", defaults.snomed_chunk_size),
            loinc_chunk_size: positive_or(&lookup, "IMPORTER_LOINC_CHUNK_SIZE", defaults.loinc_chunk_size),
            page_limit: parse_or(&lookup, "IMPORTER_PAGE_LIMIT", defaults.page_limit),
            retention: Duration::from_secs(retention_hours.saturating_mul(3600)),
        }
    }

    /// Returns the range query page size for a chunk size.
    pub fn page_limit_for(&self, chunk_size: usize) -> usize {
        if self.page_limit == 0 {
            chunk_size
        } else {
            self.page_limit
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value {:?} for {}, using the default", raw, key);
            default
        }),
        None => default,
    }
}

fn positive_or<F>(lookup: &F, key: &str, default: usize) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, key, default) {
        0 => {
            tracing::warn!("{} must be positive, using {}", key, default);
            default
        }
        value => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ImporterConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ImporterConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config, ImporterConfig::default());
        assert_eq!(config.port, 50061);
        assert_eq!(config.snomed_chunk_size, 1000);
        assert_eq!(config.loinc_chunk_size, 100);
        assert_eq!(config.retention, Duration::from_secs(7 * 24 * 3600));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("IMPORTER_BASE_FOLDER", "/data/releases"),
            ("IMPORTER_PORT", "6000"),
            ("IMPORTER_LOINC_CHUNK_SIZE", "50"),
            ("IMPORTER_PAGE_LIMIT", "20"),
            ("IMPORTER_RETENTION_HOURS", "1"),
        ]);
        assert_eq!(config.base_folder, PathBuf::from("/data/releases"));
        assert_eq!(config.port, 6000);
        assert_eq!(config.loinc_chunk_size, 50);
        assert_eq!(config.page_limit_for(50), 20);
        assert_eq!(config.retention, Duration::from_secs(3600));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config(&[
            ("IMPORTER_PORT", "not-a-port"),
            ("IMPORTER_SNOMED_CHUNK_SIZE", "0"),
        ]);
        assert_eq!(config.port, 50061);
        assert_eq!(config.snomed_chunk_size, 1000);
        assert_eq!(config.page_limit_for(1000), 1000);
    }
}
