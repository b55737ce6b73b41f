use log::debug;
use rand::seq::SliceRandom;
use rand::RngCore;

use crate::task::Task;

use super::job_mix::JobMixEntry;

pub trait WorkloadGenerator {
    /// Produces the full list of tasks of a run in submission order.
    fn get_workload(&self, rand: &mut dyn RngCore) -> Vec<Task>;

    /// Upper bound on the number of generated tasks.
    fn get_full_size_hint(&self) -> Option<u64> {
        None
    }
}

/// Expands a job mix into tasks with exact per-variant counts and a uniformly shuffled order.
pub struct JobMixWorkloadGenerator {
    entries: Vec<JobMixEntry>,
}

impl JobMixWorkloadGenerator {
    pub fn new(entries: Vec<JobMixEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[JobMixEntry] {
        &self.entries
    }

    /// Tasks grouped by entry and variant, before shuffling.
    pub fn ordered_tasks(&self) -> Vec<Task> {
        let mut tasks = Vec::with_capacity(self.get_full_size_hint().unwrap_or(0) as usize);
        for entry in &self.entries {
            for (variant, count) in entry.durations.iter().zip(entry.variant_counts()) {
                debug!(
                    "Job mix: {} x ({} nodes, {} min)",
                    count, entry.nodes, variant.minutes
                );
                tasks.extend(std::iter::repeat(Task::new(entry.nodes, variant.minutes)).take(count as usize));
            }
        }
        tasks
    }
}

impl WorkloadGenerator for JobMixWorkloadGenerator {
    fn get_workload(&self, rand: &mut dyn RngCore) -> Vec<Task> {
        let mut tasks = self.ordered_tasks();
        tasks.shuffle(rand);
        tasks
    }

    fn get_full_size_hint(&self) -> Option<u64> {
        Some(self.entries.iter().map(|e| e.count as u64).sum())
    }
}
