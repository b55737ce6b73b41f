//! Benchmark configuration.

use std::path::Path;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::scheduler::SchedulerConfig;
use crate::workload::JobMixEntry;

pub const DEFAULT_TEST_HOURS: f64 = 4.5;
pub const DEFAULT_TOTAL_NODES: u32 = 64;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("can't read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("can't parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("can't parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("`queue_name` is missing or empty")]
    MissingQueue,
    #[error("job mix is empty")]
    EmptyJobMix,
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: String, reason: String },
    #[error("unknown cluster backend `{0}`")]
    UnknownBackend(String),
}

impl ConfigError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// YAML for `.yaml`/`.yml` files, JSON otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()) {
            Some(ext) if ext == "yaml" || ext == "yml" => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Holds raw benchmark config parsed from file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawBenchmarkConfig {
    pub total_test_hours: Option<f64>,
    pub total_nodes: Option<u32>,
    pub queue_name: Option<String>,
    pub jobs: Option<Vec<JobMixEntry>>,
    pub seed: Option<u64>,
    pub scheduler: Option<SchedulerConfig>,
}

/// Represents validated benchmark configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct BenchmarkConfig {
    // test window length in hours
    pub total_test_hours: f64,
    // nodes available to the benchmark
    pub total_nodes: u32,
    // partition jobs are submitted to
    pub queue_name: String,
    pub jobs: Vec<JobMixEntry>,
    pub seed: Option<u64>,
    pub scheduler: SchedulerConfig,
}

impl BenchmarkConfig {
    /// Reads config from JSON or YAML file (chosen by extension), using default values for absent
    /// optional parameters.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, ConfigFormat::from_path(path))
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let raw: RawBenchmarkConfig = match format {
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        };
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawBenchmarkConfig) -> Result<Self, ConfigError> {
        let queue_name = raw
            .queue_name
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or(ConfigError::MissingQueue)?;
        let jobs = raw.jobs.unwrap_or_default();
        if jobs.is_empty() {
            return Err(ConfigError::EmptyJobMix);
        }

        let config = Self {
            total_test_hours: raw.total_test_hours.unwrap_or(DEFAULT_TEST_HOURS),
            total_nodes: raw.total_nodes.unwrap_or(DEFAULT_TOTAL_NODES),
            queue_name,
            jobs,
            seed: raw.seed,
            scheduler: raw.scheduler.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_name.trim().is_empty() {
            return Err(ConfigError::MissingQueue);
        }
        if self.jobs.is_empty() {
            return Err(ConfigError::EmptyJobMix);
        }
        if !self.total_test_hours.is_finite() || self.total_test_hours < 0. {
            return Err(ConfigError::invalid(
                "total_test_hours",
                format!("expected non-negative number, got {}", self.total_test_hours),
            ));
        }
        if Duration::try_from_secs_f64(self.window_seconds()).is_err() {
            return Err(ConfigError::invalid(
                "total_test_hours",
                format!("{} hours is too long for a test window", self.total_test_hours),
            ));
        }
        if self.total_nodes == 0 {
            return Err(ConfigError::invalid("total_nodes", "must be positive"));
        }

        for (i, job) in self.jobs.iter().enumerate() {
            if job.nodes == 0 {
                return Err(ConfigError::invalid(format!("jobs[{}].nodes", i), "must be positive"));
            }
            for (j, variant) in job.durations.iter().enumerate() {
                if variant.minutes == 0 {
                    return Err(ConfigError::invalid(
                        format!("jobs[{}].durations[{}].minutes", i, j),
                        "must be positive",
                    ));
                }
                if !variant.ratio.is_finite() || variant.ratio < 0. {
                    return Err(ConfigError::invalid(
                        format!("jobs[{}].durations[{}].ratio", i, j),
                        format!("expected non-negative number, got {}", variant.ratio),
                    ));
                }
            }
            if job.nodes > self.total_nodes {
                warn!(
                    "Jobs of entry {} need {} nodes but only {} are available, they will never be admitted",
                    i, job.nodes, self.total_nodes
                );
            }
            if job.count > 0 && !(job.total_ratio() > 0.) {
                warn!("Entry {} has no duration with positive ratio, it produces no jobs", i);
            }
        }

        self.scheduler.validate()
    }

    pub fn window_seconds(&self) -> f64 {
        self.total_test_hours * 3600.
    }
}
