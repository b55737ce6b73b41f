//! Time-bounded admission loop.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};
use rand::Rng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::capacity::{Capacity, CapacityFailurePolicy, CapacityTracker};
use crate::clock::Clock;
use crate::cluster::{JobSubmitter, SubmitRequest};
use crate::config::ConfigError;
use crate::storage::JobStorage;
use crate::task::{SubmittedJob, Task};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    // delay after every submission attempt (s)
    pub pacing_delay: f64,
    // backoff when the next task doesn't fit is sampled from [backoff_min; backoff_max] (s)
    pub backoff_min: f64,
    pub backoff_max: f64,
    // failed submissions of one task before it is skipped, 0 retries forever
    pub max_submit_attempts: u32,
    pub on_capacity_error: CapacityFailurePolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pacing_delay: 1.,
            backoff_min: 5.,
            backoff_max: 10.,
            max_submit_attempts: 5,
            on_capacity_error: CapacityFailurePolicy::AssumeIdle,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |field: &str, value: f64| {
            if value.is_finite() && value > 0. {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field: format!("scheduler.{}", field),
                    reason: format!("expected positive number, got {}", value),
                })
            }
        };
        positive("pacing_delay", self.pacing_delay)?;
        positive("backoff_min", self.backoff_min)?;
        positive("backoff_max", self.backoff_max)?;
        if self.backoff_min > self.backoff_max {
            return Err(ConfigError::Invalid {
                field: "scheduler.backoff_min".to_string(),
                reason: format!("{} is greater than backoff_max {}", self.backoff_min, self.backoff_max),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Draining,
    Finished,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdmissionStats {
    pub submit_attempts: u64,
    pub submit_failures: u64,
    pub backoffs: u64,
    // tasks given up after `max_submit_attempts` failed submissions
    pub skipped_tasks: Vec<Task>,
}

/// Result of the admission loop.
#[derive(Debug, Clone)]
pub struct AdmissionOutcome {
    pub jobs: JobStorage,
    pub stats: AdmissionStats,
    // tasks the window closed on
    pub unsubmitted: Vec<Task>,
    pub window_start: f64,
    pub window_end: f64,
}

/// Submits tasks in order while the cluster has room for them, until the task list is exhausted
/// or the test window closes. After the last submission it waits out the rest of the window so
/// that admitted jobs get the full window to finish.
pub struct AdmissionScheduler {
    config: SchedulerConfig,
    queue: String,
    window: f64,
    window_start: f64,
    window_end: f64,

    tasks: Vec<Task>,
    cursor: usize,
    // failed submissions of the task under the cursor
    attempts: u32,

    capacity: CapacityTracker,
    submitter: Rc<RefCell<dyn JobSubmitter>>,
    clock: Rc<dyn Clock>,
    rand: Pcg64,

    storage: JobStorage,
    stats: AdmissionStats,
    state: SchedulerState,
}

impl AdmissionScheduler {
    /// `window` is the test window length in seconds. It starts when [`run`](Self::run) is called.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tasks: Vec<Task>,
        config: SchedulerConfig,
        queue: String,
        window: f64,
        capacity: CapacityTracker,
        submitter: Rc<RefCell<dyn JobSubmitter>>,
        clock: Rc<dyn Clock>,
        rand: Pcg64,
    ) -> Self {
        debug_assert!(
            config.backoff_min <= config.backoff_max,
            "Invalid backoff range [{}; {}]",
            config.backoff_min,
            config.backoff_max
        );
        Self {
            config,
            queue,
            window,
            window_start: 0.,
            window_end: 0.,
            tasks,
            cursor: 0,
            attempts: 0,
            capacity,
            submitter,
            clock,
            rand,
            storage: JobStorage::new(),
            stats: AdmissionStats::default(),
            state: SchedulerState::Running,
        }
    }

    pub fn run(mut self) -> AdmissionOutcome {
        self.window_start = self.clock.time();
        self.window_end = self.window_start + self.window;
        info!(
            "Starting admission of {} tasks, test window {:.0}s, {} nodes, queue {}",
            self.tasks.len(),
            self.window,
            self.capacity.total_nodes(),
            self.queue
        );

        loop {
            match self.state {
                SchedulerState::Running => self.step(),
                SchedulerState::Draining => self.drain(),
                SchedulerState::Finished => break,
            }
        }

        info!(
            "Admission finished: {} jobs submitted, {} tasks skipped, {} tasks not submitted",
            self.storage.len(),
            self.stats.skipped_tasks.len(),
            self.tasks.len() - self.cursor
        );

        let unsubmitted = self.tasks.split_off(self.cursor);
        AdmissionOutcome {
            jobs: self.storage,
            stats: self.stats,
            unsubmitted,
            window_start: self.window_start,
            window_end: self.window_end,
        }
    }

    fn step(&mut self) {
        let now = self.clock.time();
        if now >= self.window_end {
            info!(
                "Test window elapsed with {} tasks not submitted",
                self.tasks.len() - self.cursor
            );
            self.state = SchedulerState::Finished;
            return;
        }

        let Some(task) = self.tasks.get(self.cursor).copied() else {
            self.state = SchedulerState::Draining;
            return;
        };

        let Some(capacity) = self.capacity.capacity() else {
            self.backoff();
            return;
        };

        if task.nodes <= capacity.available {
            self.try_submit(task, capacity);
            self.pause(self.config.pacing_delay);
        } else {
            debug!(
                "Task needs {} nodes, {} of {} are free",
                task.nodes,
                capacity.available,
                self.capacity.total_nodes()
            );
            self.backoff();
        }
    }

    fn try_submit(&mut self, task: Task, capacity: Capacity) {
        let submit_time = self.clock.time();
        if submit_time >= self.window_end {
            return;
        }

        self.stats.submit_attempts += 1;
        let request = SubmitRequest::new(task, &self.queue);
        let result = self.submitter.borrow_mut().submit(&request);
        match result {
            Ok(receipt) => {
                info!(
                    "[{:.0}s] Submitted job {}: nodes={}, duration={}min, used nodes {}/{}, script={}",
                    submit_time - self.window_start,
                    receipt.job_id,
                    task.nodes,
                    task.duration_minutes,
                    capacity.used,
                    self.capacity.total_nodes(),
                    receipt.script
                );
                self.storage.push(SubmittedJob::new(
                    receipt.job_id,
                    task,
                    submit_time - self.window_start,
                    receipt.script,
                ));
                self.advance();
            }
            Err(e) => {
                self.stats.submit_failures += 1;
                self.attempts += 1;
                warn!(
                    "Submission of {} nodes x {}min failed (attempt {}): {}",
                    task.nodes, task.duration_minutes, self.attempts, e
                );
                if self.config.max_submit_attempts > 0 && self.attempts >= self.config.max_submit_attempts {
                    warn!(
                        "Skipping {} nodes x {}min task after {} failed submissions",
                        task.nodes, task.duration_minutes, self.attempts
                    );
                    self.stats.skipped_tasks.push(task);
                    self.advance();
                }
            }
        }
    }

    fn advance(&mut self) {
        self.cursor += 1;
        self.attempts = 0;
    }

    fn backoff(&mut self) {
        let delay = self.rand.gen_range(self.config.backoff_min..=self.config.backoff_max);
        self.stats.backoffs += 1;
        debug!("Backing off for {:.1}s", delay);
        self.pause(delay);
    }

    /// Sleeps for `duration`, but never past the end of the window.
    fn pause(&self, duration: f64) {
        let remaining = self.window_end - self.clock.time();
        self.clock.sleep(duration.min(remaining));
    }

    fn drain(&mut self) {
        let remaining = self.window_end - self.clock.time();
        if remaining > 0. {
            info!(
                "All tasks submitted, waiting {:.0}s until the end of the test",
                remaining
            );
            self.clock.sleep(remaining);
        }
        self.state = SchedulerState::Finished;
    }
}
