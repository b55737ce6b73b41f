pub mod generator;
pub mod job_mix;

pub use generator::{JobMixWorkloadGenerator, WorkloadGenerator};
pub use job_mix::{DurationVariant, JobMixEntry};
