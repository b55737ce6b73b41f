use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use log::info;
use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::capacity::CapacityTracker;
use crate::clock::Clock;
use crate::cluster::{ClusterState, JobAccounting, JobSubmitter};
use crate::config::{BenchmarkConfig, ConfigError};
use crate::metrics::{MetricsCalculator, RunMetrics};
use crate::scheduler::{AdmissionScheduler, AdmissionStats};
use crate::task::{SubmittedJob, Task};
use crate::workload::{JobMixWorkloadGenerator, WorkloadGenerator};

/// Everything a run hands over to persistence and reporting.
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub seed: u64,
    // wall-clock time the test window opened
    pub started_at: DateTime<Utc>,
    pub generated_tasks: usize,
    pub jobs: Vec<SubmittedJob>,
    pub unsubmitted: Vec<Task>,
    pub stats: AdmissionStats,
    pub metrics: RunMetrics,
}

pub struct ThroughputBenchmark {
    config: BenchmarkConfig,
    seed: u64,
    clock: Rc<dyn Clock>,
    cluster_state: Rc<RefCell<dyn ClusterState>>,
    submitter: Rc<RefCell<dyn JobSubmitter>>,
    accounting: Rc<RefCell<dyn JobAccounting>>,
}

impl ThroughputBenchmark {
    /// Runs the benchmark against a single batch system implementing all cluster interfaces.
    pub fn new<C>(
        config: BenchmarkConfig,
        clock: Rc<dyn Clock>,
        cluster: Rc<RefCell<C>>,
    ) -> Result<Self, ConfigError>
    where
        C: ClusterState + JobSubmitter + JobAccounting + 'static,
    {
        Self::from_parts(config, clock, cluster.clone(), cluster.clone(), cluster)
    }

    /// Fails if `config` doesn't pass [`BenchmarkConfig::validate`].
    pub fn from_parts(
        config: BenchmarkConfig,
        clock: Rc<dyn Clock>,
        cluster_state: Rc<RefCell<dyn ClusterState>>,
        submitter: Rc<RefCell<dyn JobSubmitter>>,
        accounting: Rc<RefCell<dyn JobAccounting>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| thread_rng().gen());
        Ok(Self {
            config,
            seed,
            clock,
            cluster_state,
            submitter,
            accounting,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn run(&self) -> BenchmarkResult {
        info!("Using seed {}", self.seed);
        let mut rand = Pcg64::seed_from_u64(self.seed);

        let generator = JobMixWorkloadGenerator::new(self.config.jobs.clone());
        let tasks = generator.get_workload(&mut rand);
        let generated_tasks = tasks.len();
        info!("Generated {} tasks", generated_tasks);

        let capacity = CapacityTracker::new(
            self.cluster_state.clone(),
            self.config.total_nodes,
            self.config.scheduler.on_capacity_error,
        );
        let scheduler = AdmissionScheduler::new(
            tasks,
            self.config.scheduler.clone(),
            self.config.queue_name.clone(),
            self.config.window_seconds(),
            capacity,
            self.submitter.clone(),
            self.clock.clone(),
            rand,
        );
        let started_at = Utc::now();
        let mut outcome = scheduler.run();

        let calculator = MetricsCalculator::new(self.config.total_nodes, self.config.total_test_hours);
        calculator.resolve_outcomes(&mut outcome.jobs, &mut *self.accounting.borrow_mut());
        let metrics = calculator.compute(outcome.jobs.jobs());

        BenchmarkResult {
            seed: self.seed,
            started_at,
            generated_tasks,
            jobs: outcome.jobs.into_jobs(),
            unsubmitted: outcome.unsubmitted,
            stats: outcome.stats,
            metrics,
        }
    }
}
