//! Interfaces to the batch system under test.
//!
//! The admission loop only needs three capabilities: the number of nodes held by running jobs,
//! job submission, and a batched completion lookup. Each real batch system is an adapter
//! implementing these traits.

pub mod backend;
pub mod simulated;
pub mod slurm;
pub mod templates;

use std::collections::HashMap;

use serde::Serialize;

use crate::task::{JobId, Task};

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status:?}: {stderr}")]
    Command {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
    #[error("cannot parse {what} from `{output}`")]
    Parse { what: &'static str, output: String },
    #[error("no job script template for {minutes} min jobs")]
    MissingTemplate { minutes: u32 },
    #[error("job rejected: {0}")]
    Rejected(String),
    #[error("cluster is unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitRequest {
    pub nodes: u32,
    pub duration_minutes: u32,
    pub queue: String,
}

impl SubmitRequest {
    pub fn new(task: Task, queue: &str) -> Self {
        Self {
            nodes: task.nodes,
            duration_minutes: task.duration_minutes,
            queue: queue.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitReceipt {
    pub job_id: JobId,
    /// Reference to the job script the batch system ran.
    pub script: String,
}

pub trait ClusterState {
    /// Nodes held by jobs in the running state. Pending jobs are not counted.
    fn used_nodes(&mut self) -> Result<u32, ClusterError>;
}

pub trait JobSubmitter {
    fn submit(&mut self, request: &SubmitRequest) -> Result<SubmitReceipt, ClusterError>;
}

pub trait JobAccounting {
    /// Completion state for a batch of jobs. Jobs missing from the result are not completed.
    fn completion_states(&mut self, job_ids: &[JobId]) -> Result<HashMap<JobId, bool>, ClusterError>;
}
