#![allow(dead_code)]

use std::collections::HashMap;
use std::rc::Rc;

use dslab_throughput::cluster::simulated::SimulatedCluster;
use dslab_throughput::cluster::{
    ClusterError, ClusterState, JobAccounting, JobSubmitter, SubmitReceipt, SubmitRequest,
};
use dslab_throughput::task::JobId;
use dslab_throughput::workload::{DurationVariant, JobMixEntry};
use dslab_throughput::{Clock, VirtualClock};

pub fn entry(nodes: u32, count: u32, durations: &[(u32, f64)]) -> JobMixEntry {
    JobMixEntry {
        nodes,
        count,
        durations: durations
            .iter()
            .map(|&(minutes, ratio)| DurationVariant { minutes, ratio })
            .collect(),
    }
}

/// Cluster with scripted answers. Reports a fixed number of used nodes and never finishes jobs.
pub struct FakeCluster {
    clock: Rc<VirtualClock>,
    pub used_nodes: u32,
    pub fail_used_nodes: bool,
    // time every occupancy query takes
    pub query_delay: f64,
    // number of upcoming submissions to reject
    pub failing_submits: u32,
    pub reject_all: bool,
    pub submissions: Vec<(f64, SubmitRequest)>,
    next_job_id: u64,
}

impl FakeCluster {
    pub fn new(clock: Rc<VirtualClock>) -> Self {
        Self {
            clock,
            used_nodes: 0,
            fail_used_nodes: false,
            query_delay: 0.,
            failing_submits: 0,
            reject_all: false,
            submissions: Vec::new(),
            next_job_id: 100,
        }
    }
}

impl ClusterState for FakeCluster {
    fn used_nodes(&mut self) -> Result<u32, ClusterError> {
        self.clock.advance(self.query_delay);
        if self.fail_used_nodes {
            return Err(ClusterError::Unavailable("squeue timed out".to_string()));
        }
        Ok(self.used_nodes)
    }
}

impl JobSubmitter for FakeCluster {
    fn submit(&mut self, request: &SubmitRequest) -> Result<SubmitReceipt, ClusterError> {
        if self.reject_all {
            return Err(ClusterError::Rejected("partition is down".to_string()));
        }
        if self.failing_submits > 0 {
            self.failing_submits -= 1;
            return Err(ClusterError::Unavailable("slurmctld is not responding".to_string()));
        }
        self.submissions.push((self.clock.time(), request.clone()));
        let job_id = self.next_job_id.to_string();
        self.next_job_id += 1;
        Ok(SubmitReceipt {
            job_id,
            script: format!("job_{}min.slurm", request.duration_minutes),
        })
    }
}

/// Simulated cluster that remembers the occupancy seen right before each submission.
pub struct RecordingCluster {
    pub inner: SimulatedCluster,
    // (used nodes before submission, requested nodes)
    pub submissions: Vec<(u32, u32)>,
}

impl RecordingCluster {
    pub fn new(total_nodes: u32, clock: Rc<dyn Clock>) -> Self {
        Self {
            inner: SimulatedCluster::new(total_nodes, clock),
            submissions: Vec::new(),
        }
    }
}

impl ClusterState for RecordingCluster {
    fn used_nodes(&mut self) -> Result<u32, ClusterError> {
        self.inner.used_nodes()
    }
}

impl JobSubmitter for RecordingCluster {
    fn submit(&mut self, request: &SubmitRequest) -> Result<SubmitReceipt, ClusterError> {
        let used = self.inner.used_nodes()?;
        self.submissions.push((used, request.nodes));
        self.inner.submit(request)
    }
}

impl JobAccounting for RecordingCluster {
    fn completion_states(&mut self, job_ids: &[JobId]) -> Result<HashMap<JobId, bool>, ClusterError> {
        self.inner.completion_states(job_ids)
    }
}

/// Accounting with fixed job states.
pub struct StaticAccounting {
    pub states: HashMap<JobId, bool>,
    pub fail: bool,
    pub queries: Vec<Vec<JobId>>,
}

impl StaticAccounting {
    pub fn new(states: HashMap<JobId, bool>) -> Self {
        Self {
            states,
            fail: false,
            queries: Vec::new(),
        }
    }
}

impl JobAccounting for StaticAccounting {
    fn completion_states(&mut self, job_ids: &[JobId]) -> Result<HashMap<JobId, bool>, ClusterError> {
        self.queries.push(job_ids.to_vec());
        if self.fail {
            return Err(ClusterError::Command {
                command: "sacct".to_string(),
                status: Some(1),
                stderr: "slurmdbd unavailable".to_string(),
            });
        }
        Ok(job_ids
            .iter()
            .filter_map(|id| self.states.get(id).map(|&completed| (id.clone(), completed)))
            .collect())
    }
}
