//! Synthetic job-throughput benchmark for batch clusters.
//!
//! A job mix is expanded into a shuffled task list, tasks are admitted into the cluster while
//! free nodes allow it, and after the test window the completed jobs are turned into throughput
//! and utilization figures.

pub mod benchmark;
pub mod capacity;
pub mod clock;
pub mod cluster;
pub mod config;
pub mod export;
pub mod metrics;
pub mod report;
pub mod scheduler;
pub mod storage;
pub mod task;
pub mod workload;

pub use benchmark::{BenchmarkResult, ThroughputBenchmark};
pub use clock::{Clock, VirtualClock, WallClock};
pub use cluster::{ClusterError, ClusterState, JobAccounting, JobSubmitter};
pub use config::bench_config::BenchmarkConfig;
pub use metrics::{MetricsCalculator, RunMetrics};
pub use scheduler::{AdmissionScheduler, SchedulerConfig};
pub use task::{JobOutcome, SubmittedJob, Task};
pub use workload::generator::WorkloadGenerator;
