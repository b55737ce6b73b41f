//! Batch scripts that occupy the allocated nodes for the job duration.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::workload::JobMixEntry;

pub fn template_file_name(minutes: u32) -> String {
    format!("job_{}min.slurm", minutes)
}

pub fn template_body(minutes: u32) -> String {
    format!(
        "#!/bin/bash\n#SBATCH --exclusive\n#SBATCH --output=%j.out\n\nsleep {}\n",
        minutes as u64 * 60
    )
}

/// Script path for every distinct duration of the job mix.
pub fn templates_for_mix(jobs: &[JobMixEntry], dir: &Path) -> BTreeMap<u32, PathBuf> {
    jobs.iter()
        .flat_map(|job| job.durations.iter())
        .map(|d| (d.minutes, dir.join(template_file_name(d.minutes))))
        .collect()
}

/// Writes the scripts that don't exist yet. Existing files are left untouched so that
/// hand-edited templates survive between runs.
pub fn write_templates(templates: &BTreeMap<u32, PathBuf>) -> io::Result<()> {
    for (minutes, path) in templates {
        if path.exists() {
            debug!("Template {} already exists", path.display());
            continue;
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, template_body(*minutes))?;
        info!("Created job script {}", path.display());
    }
    Ok(())
}
