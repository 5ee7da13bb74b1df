use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Name of the built-in workload to run.
    #[arg(short, long, default_value = "wc")]
    pub workload: String,

    /// Unix socket the coordinator listens on. Defaults to the
    /// per-user path under /var/tmp.
    #[arg(short, long)]
    pub socket: Option<PathBuf>,

    /// Directory to place intermediate and final output files in. Must
    /// be on the filesystem shared with the other workers.
    #[arg(short = 'd', long, default_value = ".")]
    pub work_dir: PathBuf,
}
