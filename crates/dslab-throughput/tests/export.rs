use chrono::{DateTime, TimeZone, Utc};

use dslab_throughput::export::{read_jobs_csv, write_jobs_csv, write_metrics_json};
use dslab_throughput::{MetricsCalculator, SubmittedJob, Task};

fn jobs() -> Vec<SubmittedJob> {
    let mut completed = SubmittedJob::new("101".to_string(), Task::new(2, 15), 0., "job_15min.slurm".to_string());
    completed.resolve(true);
    let mut failed = SubmittedJob::new("102".to_string(), Task::new(4, 60), 12.5, "job_60min.slurm".to_string());
    failed.resolve(false);
    let pending = SubmittedJob::new("103".to_string(), Task::new(1, 5), 30., "job_5min.slurm".to_string());
    vec![completed, failed, pending]
}

#[test]
fn test_jobs_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.csv");
    write_jobs_csv(&path, &jobs()).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("job_id,nodes,duration_minutes,submit_time,script,finished")
    );
    assert_eq!(lines.next(), Some("101,2,15,0.0,job_15min.slurm,completed"));

    assert_eq!(read_jobs_csv(&path).unwrap(), jobs());
}

#[test]
fn test_metrics_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrics.json");
    let metrics = MetricsCalculator::new(4, 1.).compute(&jobs());
    let started_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    write_metrics_json(&path, &metrics, started_at).unwrap();

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["submitted_jobs"], 3);
    assert_eq!(value["completed_jobs"], 1);
    assert_eq!(value["total_node_seconds"], 1800);
    assert_eq!(value["throughput"], 1.0);
    let recorded = value["started_at"].as_str().unwrap().parse::<DateTime<Utc>>().unwrap();
    assert_eq!(recorded, started_at);
}
