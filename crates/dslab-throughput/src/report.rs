//! Human-readable run summary.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::benchmark::BenchmarkResult;
use crate::task::{JobOutcome, SubmittedJob, Task};

fn count_tasks(tasks: impl Iterator<Item = Task>) -> BTreeMap<Task, usize> {
    let mut counts = BTreeMap::new();
    for task in tasks {
        *counts.entry(task).or_insert(0) += 1;
    }
    counts
}

fn write_task_counts(out: &mut String, title: &str, counts: &BTreeMap<Task, usize>) {
    if counts.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}:", title);
    for (task, count) in counts {
        let _ = writeln!(out, "  {:>4} nodes x {:>4} min: {}", task.nodes, task.duration_minutes, count);
    }
}

pub fn render_summary(result: &BenchmarkResult) -> String {
    let metrics = &result.metrics;
    let mut out = String::new();

    let _ = writeln!(out, "Seed: {}", result.seed);
    let _ = writeln!(out, "Started at: {}", result.started_at.to_rfc3339());
    let _ = writeln!(
        out,
        "Tasks: {} generated, {} submitted, {} skipped, {} not submitted",
        result.generated_tasks,
        metrics.submitted_jobs,
        result.stats.skipped_tasks.len(),
        result.unsubmitted.len()
    );
    let _ = writeln!(
        out,
        "Submissions: {} attempts, {} failed, {} backoffs",
        result.stats.submit_attempts, result.stats.submit_failures, result.stats.backoffs
    );
    let _ = writeln!(
        out,
        "Jobs: {} completed, {} not completed",
        metrics.completed_jobs,
        metrics.submitted_jobs - metrics.completed_jobs
    );
    let _ = writeln!(
        out,
        "Throughput: ST = M / T = {} / {:.2} h = {:.2} jobs/h",
        metrics.completed_jobs, metrics.test_duration_hours, metrics.throughput
    );
    let _ = writeln!(
        out,
        "Utilization: U = sum(Nj * Tj) / (N_total * T_total) = {} / {:.0} = {:.2}%",
        metrics.total_node_seconds, metrics.capacity_node_seconds, metrics.utilization_percent
    );

    let completed = count_tasks(
        result
            .jobs
            .iter()
            .filter(|job| job.finished.is_completed())
            .map(|job| job.task()),
    );
    write_task_counts(&mut out, "Completed jobs", &completed);
    write_task_counts(&mut out, "Skipped tasks", &count_tasks(result.stats.skipped_tasks.iter().copied()));
    write_task_counts(&mut out, "Not submitted tasks", &count_tasks(result.unsubmitted.iter().copied()));
    out
}

pub fn render_jobs_table(jobs: &[SubmittedJob]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:>6} {:>9} {:>10}  {:<14} {}",
        "job_id", "nodes", "duration", "submitted", "outcome", "script"
    );
    for job in jobs {
        let outcome = match job.finished {
            JobOutcome::Unknown => "unknown",
            JobOutcome::Completed => "completed",
            JobOutcome::NotCompleted => "not_completed",
        };
        let _ = writeln!(
            out,
            "{:<12} {:>6} {:>7}min {:>9.0}s  {:<14} {}",
            job.job_id, job.nodes, job.duration_minutes, job.submit_time, outcome, job.script
        );
    }
    out
}
