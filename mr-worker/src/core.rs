//
// Import gRPC stubs/definitions.
//
pub use mapreduce::coordinator_client::CoordinatorClient;
pub use mapreduce::{
    EchoRequest, GetTaskRequest, MapResult, MapTask, PerformTaskRequest, ReduceResult, ReduceTask,
};
pub mod mapreduce {
    tonic::include_proto!("mapreduce");
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::UnixStream;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;
use tracing::{info, warn};

use common::Workload;

use crate::{map, reduce};

/// How often to poll again when the coordinator had nothing assignable.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bounded backoff for the initial connection: a coordinator hiccup at
/// startup should not kill a healthy worker.
const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Open a channel to the coordinator's Unix domain socket, retrying
/// with exponential backoff before giving up.
pub async fn connect(socket: &Path) -> Result<Channel> {
    // The URI is required by the HTTP/2 layer but unused: the connector
    // below always dials the socket path.
    let endpoint = Endpoint::try_from("http://[::]:50051")?;

    let mut delay = CONNECT_BASE_DELAY;
    for attempt in 1..=CONNECT_ATTEMPTS {
        let path = socket.to_path_buf();
        match endpoint
            .connect_with_connector(service_fn(move |_: Uri| UnixStream::connect(path.clone())))
            .await
        {
            Ok(channel) => return Ok(channel),
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                warn!(attempt, "cannot reach coordinator yet: {e}");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("cannot connect to coordinator at {}", socket.display())
                })
            }
        }
    }
    unreachable!("connect loop returns on success or final error")
}

/// Intermediate file paths are reported to the coordinator verbatim and
/// later opened by reducers running in other processes, from other
/// working directories. The work dir is pinned to an absolute path once
/// so those reports stay meaningful everywhere.
fn absolute_work_dir(work_dir: PathBuf) -> Result<PathBuf> {
    work_dir
        .canonicalize()
        .with_context(|| format!("cannot resolve work dir {}", work_dir.display()))
}

/// One worker: a sequential poll-execute-report loop around an injected
/// map/reduce pair.
pub struct MRWorker {
    client: CoordinatorClient<Channel>,
    workload: Workload,
    work_dir: PathBuf,
}

impl MRWorker {
    pub async fn connect(socket: &Path, workload: Workload, work_dir: PathBuf) -> Result<Self> {
        let channel = connect(socket).await?;
        Ok(MRWorker {
            client: CoordinatorClient::new(channel),
            workload,
            work_dir: absolute_work_dir(work_dir)?,
        })
    }

    /// Poll until the coordinator reports the job done. Each returned
    /// task is executed locally and its outcome reported before the
    /// next poll; a failed task execution is reported, not fatal.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let reply = self
                .client
                .get_task(GetTaskRequest {})
                .await
                .context("GetTask call failed")?
                .into_inner();

            if reply.done {
                info!("job complete, worker exiting");
                return Ok(());
            }

            let callback = if let Some(task) = reply.map_task {
                PerformTaskRequest {
                    map_result: Some(map::perform_map(&task, self.workload.map_fn, &self.work_dir)),
                    reduce_result: None,
                }
            } else if let Some(task) = reply.reduce_task {
                PerformTaskRequest {
                    map_result: None,
                    reduce_result: Some(reduce::perform_reduce(
                        &task,
                        self.workload.reduce_fn,
                        &self.work_dir,
                    )),
                }
            } else {
                // Everything claimable is in flight; poll again shortly.
                tokio::time::sleep(POLL_INTERVAL).await;
                continue;
            };

            self.client
                .perform_task_cb(callback)
                .await
                .context("PerformTaskCb call failed")?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_work_dir_resolves_to_an_absolute_path() {
        let resolved = absolute_work_dir(PathBuf::from(".")).unwrap();
        assert!(resolved.is_absolute());
    }

    #[test]
    fn missing_work_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(absolute_work_dir(dir.path().join("nope")).is_err());
    }
}
