pub mod bench_config;
pub mod options;

pub use bench_config::{BenchmarkConfig, ConfigError};
