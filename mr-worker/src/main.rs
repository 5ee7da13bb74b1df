mod args;

use anyhow::anyhow;
use clap::Parser;

use args::Args;
use mr_worker::core::MRWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let workload = workload::try_named(&args.workload)
        .ok_or_else(|| anyhow!("`{}` is not a known workload", args.workload))?;
    let socket = args.socket.unwrap_or_else(common::utils::coordinator_socket);

    let mut worker = MRWorker::connect(&socket, workload, args.work_dir).await?;
    worker.run().await
}
