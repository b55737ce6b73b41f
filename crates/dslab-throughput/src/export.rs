//! Files written at the end of a run.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metrics::RunMetrics;
use crate::task::SubmittedJob;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// One row per submitted job: `job_id,nodes,duration_minutes,submit_time,script,finished`.
pub fn write_jobs_csv(path: impl AsRef<Path>, jobs: &[SubmittedJob]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for job in jobs {
        writer.serialize(job)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_jobs_csv(path: impl AsRef<Path>) -> Result<Vec<SubmittedJob>, ExportError> {
    let mut reader = csv::Reader::from_path(path)?;
    let jobs = reader.deserialize().collect::<Result<Vec<SubmittedJob>, _>>()?;
    Ok(jobs)
}

#[derive(Serialize)]
struct MetricsRecord<'a> {
    started_at: DateTime<Utc>,
    #[serde(flatten)]
    metrics: &'a RunMetrics,
}

/// Writes run metrics together with the wall-clock start of the test window.
/// `submit_time` values in `jobs.csv` are relative to `started_at`.
pub fn write_metrics_json(
    path: impl AsRef<Path>,
    metrics: &RunMetrics,
    started_at: DateTime<Utc>,
) -> Result<(), ExportError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &MetricsRecord { started_at, metrics })?;
    Ok(())
}
