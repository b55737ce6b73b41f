use serde::{Deserialize, Serialize};

pub type JobId = String;

/// Unit of generated workload: a job asking for `nodes` nodes for `duration_minutes` minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Task {
    pub nodes: u32,
    pub duration_minutes: u32,
}

impl Task {
    pub fn new(nodes: u32, duration_minutes: u32) -> Self {
        Self {
            nodes,
            duration_minutes,
        }
    }

    pub fn node_seconds(&self) -> u64 {
        self.nodes as u64 * self.duration_minutes as u64 * 60
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Unknown,
    Completed,
    NotCompleted,
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        *self == JobOutcome::Completed
    }
}

/// Record of a task accepted by the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedJob {
    pub job_id: JobId,
    pub nodes: u32,
    pub duration_minutes: u32,
    // seconds since the start of the run
    pub submit_time: f64,
    pub script: String,
    pub finished: JobOutcome,
}

impl SubmittedJob {
    pub fn new(job_id: JobId, task: Task, submit_time: f64, script: String) -> Self {
        Self {
            job_id,
            nodes: task.nodes,
            duration_minutes: task.duration_minutes,
            submit_time,
            script,
            finished: JobOutcome::Unknown,
        }
    }

    pub fn task(&self) -> Task {
        Task::new(self.nodes, self.duration_minutes)
    }

    /// Sets the terminal outcome. Outcomes are resolved once per run.
    pub fn resolve(&mut self, completed: bool) {
        debug_assert_eq!(
            self.finished,
            JobOutcome::Unknown,
            "Outcome of job {} is resolved twice",
            self.job_id
        );
        self.finished = if completed {
            JobOutcome::Completed
        } else {
            JobOutcome::NotCompleted
        };
    }
}
