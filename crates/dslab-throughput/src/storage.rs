use std::collections::HashMap;

use log::error;

use crate::task::{JobId, SubmittedJob};

/// Submitted jobs of a run in submission order. Records are never removed.
#[derive(Debug, Default, Clone)]
pub struct JobStorage {
    jobs: Vec<SubmittedJob>,
    index: HashMap<JobId, usize>,
}

impl JobStorage {
    pub fn new() -> JobStorage {
        JobStorage {
            jobs: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn push(&mut self, job: SubmittedJob) {
        if self.index.contains_key(&job.job_id) {
            error!("Job id {} is reported twice by the cluster", job.job_id);
        } else {
            self.index.insert(job.job_id.clone(), self.jobs.len());
        }
        self.jobs.push(job);
    }

    pub fn get(&self, job_id: &str) -> Option<&SubmittedJob> {
        self.index.get(job_id).map(|&i| &self.jobs[i])
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[SubmittedJob] {
        &self.jobs
    }

    pub fn jobs_mut(&mut self) -> impl Iterator<Item = &mut SubmittedJob> {
        self.jobs.iter_mut()
    }

    pub fn into_jobs(self) -> Vec<SubmittedJob> {
        self.jobs
    }
}
