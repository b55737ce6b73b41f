//! Slurm adapter built on `sbatch`, `squeue` and `sacct`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::process::{Command, Output};

use log::debug;

use crate::task::JobId;

use super::{ClusterError, ClusterState, JobAccounting, JobSubmitter, SubmitReceipt, SubmitRequest};

pub struct SlurmCluster {
    user: Option<String>,
    templates: BTreeMap<u32, PathBuf>,
}

impl SlurmCluster {
    /// `templates` maps a job duration in minutes to the script submitted for it.
    pub fn new(user: Option<String>, templates: BTreeMap<u32, PathBuf>) -> Self {
        Self { user, templates }
    }

    /// Reads `user` from `slurm[user=...]` options, falling back to `$USER`.
    pub fn from_options(options: &HashMap<String, String>, templates: BTreeMap<u32, PathBuf>) -> Self {
        let user = options
            .get("user")
            .cloned()
            .or_else(|| std::env::var("USER").ok());
        Self::new(user, templates)
    }

    fn run(command: &mut Command) -> Result<String, ClusterError> {
        let command_str = format!("{:?}", command);
        debug!("Running {}", command_str);
        let Output { status, stdout, stderr } = command.output().map_err(|source| ClusterError::Spawn {
            command: command_str.clone(),
            source,
        })?;
        if !status.success() {
            return Err(ClusterError::Command {
                command: command_str,
                status: status.code(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

impl ClusterState for SlurmCluster {
    fn used_nodes(&mut self) -> Result<u32, ClusterError> {
        let mut command = Command::new("squeue");
        command.args(["-h", "-o", "%i %D %T"]);
        if let Some(user) = &self.user {
            command.args(["-u", user.as_str()]);
        }
        let output = Self::run(&mut command)?;
        Ok(parse_squeue_running_nodes(&output))
    }
}

impl JobSubmitter for SlurmCluster {
    fn submit(&mut self, request: &SubmitRequest) -> Result<SubmitReceipt, ClusterError> {
        let script = self
            .templates
            .get(&request.duration_minutes)
            .ok_or(ClusterError::MissingTemplate {
                minutes: request.duration_minutes,
            })?;
        let output = Self::run(
            Command::new("sbatch")
                .arg("--parsable")
                .arg(format!("--nodes={}", request.nodes))
                .args(["-p", request.queue.as_str()])
                .arg(script),
        )?;
        let job_id = parse_sbatch_job_id(&output).ok_or_else(|| ClusterError::Parse {
            what: "job id",
            output: output.clone(),
        })?;
        Ok(SubmitReceipt {
            job_id,
            script: script.display().to_string(),
        })
    }
}

impl JobAccounting for SlurmCluster {
    fn completion_states(&mut self, job_ids: &[JobId]) -> Result<HashMap<JobId, bool>, ClusterError> {
        if job_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let output = Self::run(Command::new("sacct").args([
            "-j",
            job_ids.join(",").as_str(),
            "--format=JobID,State",
            "--noheader",
        ]))?;
        Ok(parse_sacct_states(&output, job_ids))
    }
}

/// Sums the node counts of running jobs in `squeue -h -o "%i %D %T"` output.
pub fn parse_squeue_running_nodes(output: &str) -> u32 {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let (_id, nodes, state) = (parts.next()?, parts.next()?, parts.next()?);
            if state == "RUNNING" {
                nodes.parse::<u32>().ok()
            } else {
                None
            }
        })
        .sum()
}

/// `sbatch --parsable` prints `jobid` or `jobid;cluster`.
pub fn parse_sbatch_job_id(output: &str) -> Option<JobId> {
    let token = output.split_whitespace().next()?;
    let job_id = token.split(';').next()?;
    if job_id.is_empty() {
        None
    } else {
        Some(job_id.to_string())
    }
}

/// Extracts per-job completion from `sacct --format=JobID,State --noheader` output.
///
/// Job steps (`123.batch`, `123.0`) and jobs that weren't asked for are skipped.
pub fn parse_sacct_states(output: &str, job_ids: &[JobId]) -> HashMap<JobId, bool> {
    let requested = job_ids.iter().map(|id| id.as_str()).collect::<HashSet<_>>();
    let mut states = HashMap::new();
    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let (Some(job_id), Some(state)) = (parts.next(), parts.next()) else {
            continue;
        };
        if job_id.contains('.') || !requested.contains(job_id) {
            continue;
        }
        states.insert(job_id.to_string(), state == "COMPLETED");
    }
    states
}
