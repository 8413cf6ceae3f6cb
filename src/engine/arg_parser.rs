use clap::Parser;
use std::path::PathBuf;

/// Ship finished core dumps to object storage and delete them once the upload is confirmed.
#[derive(Clone, Debug, Parser)]
#[command(name = "coredrain")]
#[command(
    about = "Watch a directory for core dumps, upload each to object storage, delete it once confirmed."
)]
pub struct Cli {
    /// Directory the crash producer writes dumps into.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Destination bucket. Default: BUCKET_NAME.
    #[arg(long, short)]
    pub bucket: Option<String>,

    /// Storage region. Default: REGION, then the SDK default chain.
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint URL. Default: S3_ENDPOINT.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Upload into this local directory (one sub-directory per bucket) instead of S3.
    #[arg(long, value_name = "DIR")]
    pub local_store: Option<PathBuf>,

    /// Liveness marker path read by the orchestrator's probes.
    #[arg(long, short = 'l', value_name = "FILE")]
    pub liveness_file: Option<PathBuf>,

    /// TOML settings file (`[settings]` table). CLI flags and environment override it.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Concurrent upload workers.
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Uploads a worker runs before its storage client is rebuilt.
    #[arg(long)]
    pub max_tasks_per_worker: Option<usize>,

    /// Seconds between upload confirmation checks.
    #[arg(long, value_name = "SECS")]
    pub confirm_delay: Option<u64>,

    /// Confirmation checks before an upload is declared lost.
    #[arg(long)]
    pub confirm_attempts: Option<u32>,

    /// Upload dumps already in DIR when the watch starts.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub sweep: Option<bool>,

    /// Seconds a swept dump must go unmodified before it is uploaded without a close event.
    #[arg(long, value_name = "SECS")]
    pub sweep_settle: Option<u64>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}
