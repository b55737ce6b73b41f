//! Cluster backend selection.

use std::collections::HashMap;
use std::str::FromStr;

use crate::config::options::{parse_config_value, parse_options};
use crate::config::ConfigError;

/// Holds supported batch system backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterBackendType {
    Slurm,
    Simulated,
}

impl FromStr for ClusterBackendType {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<ClusterBackendType, Self::Err> {
        match input.to_lowercase().as_str() {
            "slurm" => Ok(ClusterBackendType::Slurm),
            "simulated" | "sim" => Ok(ClusterBackendType::Simulated),
            _ => Err(ConfigError::UnknownBackend(input.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterBackend {
    pub backend_type: ClusterBackendType,
    pub options: HashMap<String, String>,
}

/// Resolves strings like `slurm`, `slurm[user=alice]` or `simulated`.
pub fn backend_resolver(config_str: &str) -> Result<ClusterBackend, ConfigError> {
    let (name, options) = parse_config_value(config_str);
    Ok(ClusterBackend {
        backend_type: ClusterBackendType::from_str(&name)?,
        options: options.as_deref().map(parse_options).unwrap_or_default(),
    })
}
