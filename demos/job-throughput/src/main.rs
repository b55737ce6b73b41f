use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Instant;

use clap::Parser;
use env_logger::Builder;
use log::{error, info, LevelFilter};
use sugars::{rc, refcell};

use dslab_throughput::cluster::backend::{backend_resolver, ClusterBackendType};
use dslab_throughput::cluster::simulated::SimulatedCluster;
use dslab_throughput::cluster::slurm::SlurmCluster;
use dslab_throughput::cluster::templates::{templates_for_mix, write_templates};
use dslab_throughput::export::{write_jobs_csv, write_metrics_json};
use dslab_throughput::report::render_summary;
use dslab_throughput::{BenchmarkConfig, BenchmarkResult, Clock, ThroughputBenchmark, VirtualClock, WallClock};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to benchmark config (JSON, or YAML with .yaml/.yml extension)
    config: PathBuf,

    /// Cluster backend: `slurm`, `slurm[user=NAME]` or `simulated`
    #[arg(long, default_value = "slurm")]
    cluster: String,

    /// Directory for job scripts and results
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Overrides seed from the config
    #[arg(long)]
    seed: Option<u64>,
}

fn run(args: Args) -> Result<BenchmarkResult, Box<dyn std::error::Error>> {
    let mut config = BenchmarkConfig::from_file(&args.config)?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let backend = backend_resolver(&args.cluster)?;
    fs::create_dir_all(&args.output_dir)?;

    let benchmark = match backend.backend_type {
        ClusterBackendType::Slurm => {
            let templates = templates_for_mix(&config.jobs, &args.output_dir);
            write_templates(&templates)?;
            let cluster = rc!(refcell!(SlurmCluster::from_options(&backend.options, templates)));
            ThroughputBenchmark::new(config, rc!(WallClock::new()), cluster)?
        }
        ClusterBackendType::Simulated => {
            let clock: Rc<dyn Clock> = rc!(VirtualClock::new());
            let cluster = rc!(refcell!(SimulatedCluster::new(config.total_nodes, clock.clone())));
            ThroughputBenchmark::new(config, clock, cluster)?
        }
    };

    let t = Instant::now();
    let result = benchmark.run();
    info!("Benchmark took {:.2}s", t.elapsed().as_secs_f64());

    write_jobs_csv(args.output_dir.join("jobs.csv"), &result.jobs)?;
    write_metrics_json(args.output_dir.join("metrics.json"), &result.metrics, result.started_at)?;
    Ok(result)
}

fn main() -> ExitCode {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(result) => {
            print!("{}", render_summary(&result));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
