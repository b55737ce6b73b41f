//! Throughput and utilization of a finished run.

use std::collections::HashMap;

use log::{info, warn};
use serde::Serialize;

use crate::cluster::JobAccounting;
use crate::storage::JobStorage;
use crate::task::{JobOutcome, SubmittedJob};

/// Node-time consumed by jobs against node-time offered by the cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeTimeLoad {
    // node-seconds
    pub total: f64,
    pub consumed: u64,
}

impl NodeTimeLoad {
    pub fn new(nodes: u32, seconds: f64) -> Self {
        Self {
            total: nodes as f64 * seconds,
            consumed: 0,
        }
    }

    pub fn add(&mut self, node_seconds: u64) {
        self.consumed += node_seconds;
    }

    pub fn fraction(&self) -> f64 {
        if self.total > 0. {
            self.consumed as f64 / self.total
        } else {
            0.
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    pub submitted_jobs: u64,
    pub completed_jobs: u64,
    pub test_duration_hours: f64,
    // completed jobs per hour of the configured window
    pub throughput: f64,
    pub total_node_seconds: u64,
    pub capacity_node_seconds: f64,
    pub utilization_percent: f64,
}

pub struct MetricsCalculator {
    total_nodes: u32,
    test_hours: f64,
}

impl MetricsCalculator {
    pub fn new(total_nodes: u32, test_hours: f64) -> Self {
        Self { total_nodes, test_hours }
    }

    /// Looks up completion of all unresolved jobs in one accounting query and records it.
    /// Jobs the cluster doesn't report, or all of them if the query fails, are not completed.
    /// Returns the number of jobs found completed.
    pub fn resolve_outcomes(&self, storage: &mut JobStorage, accounting: &mut dyn JobAccounting) -> usize {
        let job_ids = storage
            .jobs()
            .iter()
            .filter(|job| job.finished == JobOutcome::Unknown)
            .map(|job| job.job_id.clone())
            .collect::<Vec<_>>();
        if job_ids.is_empty() {
            return 0;
        }

        info!("Querying completion of {} jobs", job_ids.len());
        let states = accounting.completion_states(&job_ids).unwrap_or_else(|e| {
            warn!("Can't query job completion, counting all jobs as not completed: {}", e);
            HashMap::new()
        });

        let mut completed = 0;
        for job in storage.jobs_mut().filter(|job| job.finished == JobOutcome::Unknown) {
            let is_completed = states.get(&job.job_id).copied().unwrap_or(false);
            job.resolve(is_completed);
            if is_completed {
                completed += 1;
            }
        }
        info!("{} of {} jobs completed", completed, job_ids.len());
        completed
    }

    /// Throughput `ST = M / T` and utilization `U = sum(Nj * Tj) / (N_total * T_total)`.
    ///
    /// `T` is the configured window length, not the time spent submitting.
    pub fn compute(&self, jobs: &[SubmittedJob]) -> RunMetrics {
        let window_seconds = self.test_hours * 3600.;
        let mut load = NodeTimeLoad::new(self.total_nodes, window_seconds);
        let mut completed_jobs = 0;
        for job in jobs.iter().filter(|job| job.finished.is_completed()) {
            completed_jobs += 1;
            load.add(job.task().node_seconds());
        }

        let throughput = if self.test_hours > 0. {
            completed_jobs as f64 / self.test_hours
        } else {
            0.
        };

        RunMetrics {
            submitted_jobs: jobs.len() as u64,
            completed_jobs,
            test_duration_hours: self.test_hours,
            throughput,
            total_node_seconds: load.consumed,
            capacity_node_seconds: load.total,
            utilization_percent: load.fraction() * 100.,
        }
    }
}
