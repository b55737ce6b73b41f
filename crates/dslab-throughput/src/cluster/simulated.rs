//! In-memory batch system driven by a [`Clock`].
//!
//! Jobs hold their nodes exclusively and start in submission order as soon as enough nodes are
//! free. Used for dry runs with a virtual clock and as the cluster in tests.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap, VecDeque};
use std::rc::Rc;

use log::debug;

use crate::clock::Clock;
use crate::task::JobId;

use super::templates::template_file_name;
use super::{ClusterError, ClusterState, JobAccounting, JobSubmitter, SubmitReceipt, SubmitRequest};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulatedJobState {
    Pending,
    Running { start_time: f64 },
    Completed { finish_time: f64 },
}

#[derive(Debug, Clone)]
pub struct SimulatedJob {
    pub nodes: u32,
    // seconds
    pub duration: f64,
    pub queue: String,
    pub state: SimulatedJobState,
}

/// Completion of a running job. Ordered so that [`BinaryHeap`] pops the earliest one first.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Completion {
    finish_time: f64,
    job_id: u64,
}

impl Eq for Completion {}

impl PartialOrd for Completion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Completion {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .finish_time
            .total_cmp(&self.finish_time)
            .then_with(|| other.job_id.cmp(&self.job_id))
    }
}

pub struct SimulatedCluster {
    total_nodes: u32,
    free_nodes: u32,
    jobs: BTreeMap<u64, SimulatedJob>,
    pending: VecDeque<u64>,
    running: BinaryHeap<Completion>,
    next_job_id: u64,
    clock: Rc<dyn Clock>,
}

impl SimulatedCluster {
    pub fn new(total_nodes: u32, clock: Rc<dyn Clock>) -> Self {
        Self {
            total_nodes,
            free_nodes: total_nodes,
            jobs: BTreeMap::new(),
            pending: VecDeque::new(),
            running: BinaryHeap::new(),
            next_job_id: 1,
            clock,
        }
    }

    pub fn job(&self, job_id: &str) -> Option<&SimulatedJob> {
        job_id.parse::<u64>().ok().and_then(|id| self.jobs.get(&id))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// Completes every job that has finished by now, starting queued jobs as nodes get released.
    fn refresh(&mut self) {
        let now = self.clock.time();
        while self.running.peek().map_or(false, |c| c.finish_time <= now) {
            let Some(Completion { finish_time, job_id }) = self.running.pop() else {
                break;
            };
            if let Some(job) = self.jobs.get_mut(&job_id) {
                job.state = SimulatedJobState::Completed { finish_time };
                self.free_nodes += job.nodes;
                debug!("Simulated job {} finished at {:.1}", job_id, finish_time);
            }
            self.start_pending(finish_time);
        }
    }

    fn start_pending(&mut self, time: f64) {
        while let Some(&id) = self.pending.front() {
            let Some(job) = self.jobs.get_mut(&id) else {
                self.pending.pop_front();
                continue;
            };
            if job.nodes > self.free_nodes {
                break;
            }
            self.free_nodes -= job.nodes;
            job.state = SimulatedJobState::Running { start_time: time };
            self.running.push(Completion {
                finish_time: time + job.duration,
                job_id: id,
            });
            self.pending.pop_front();
        }
    }
}

impl ClusterState for SimulatedCluster {
    fn used_nodes(&mut self) -> Result<u32, ClusterError> {
        self.refresh();
        Ok(self.total_nodes - self.free_nodes)
    }
}

impl JobSubmitter for SimulatedCluster {
    fn submit(&mut self, request: &SubmitRequest) -> Result<SubmitReceipt, ClusterError> {
        if request.queue.trim().is_empty() {
            return Err(ClusterError::Rejected("queue name is empty".to_string()));
        }
        if request.nodes == 0 || request.nodes > self.total_nodes {
            return Err(ClusterError::Rejected(format!(
                "requested {} nodes, cluster has {}",
                request.nodes, self.total_nodes
            )));
        }

        self.refresh();
        let id = self.next_job_id;
        self.next_job_id += 1;
        self.jobs.insert(
            id,
            SimulatedJob {
                nodes: request.nodes,
                duration: request.duration_minutes as f64 * 60.,
                queue: request.queue.clone(),
                state: SimulatedJobState::Pending,
            },
        );
        self.pending.push_back(id);
        self.start_pending(self.clock.time());

        Ok(SubmitReceipt {
            job_id: id.to_string(),
            script: template_file_name(request.duration_minutes),
        })
    }
}

impl JobAccounting for SimulatedCluster {
    fn completion_states(&mut self, job_ids: &[JobId]) -> Result<HashMap<JobId, bool>, ClusterError> {
        self.refresh();
        Ok(job_ids
            .iter()
            .filter_map(|job_id| {
                let job = self.job(job_id)?;
                let completed = matches!(job.state, SimulatedJobState::Completed { .. });
                Some((job_id.clone(), completed))
            })
            .collect())
    }
}
