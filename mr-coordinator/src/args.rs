use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Input files, one map task each.
    #[arg(required = true)]
    pub input_files: Vec<String>,

    /// Number of reduce partitions (and final output files). The
    /// partition hash is taken modulo this, so zero is never valid.
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub n_reduce: u32,

    /// Unix socket to listen on. Defaults to the per-user path under
    /// /var/tmp shared with the workers.
    #[arg(short, long)]
    pub socket: Option<PathBuf>,

    /// Seconds an in-progress task may run before its lease expires and
    /// the task is reassigned.
    #[arg(short, long, default_value_t = 10)]
    pub task_timeout: u64,
}
