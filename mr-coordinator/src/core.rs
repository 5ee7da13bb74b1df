//
// Import gRPC stubs/definitions.
//
pub use mapreduce::coordinator_server::{Coordinator, CoordinatorServer};
use mapreduce::{
    EchoReply, EchoRequest, GetTaskReply, GetTaskRequest, MapTask, PerformTaskReply,
    PerformTaskRequest, ReduceTask,
};
pub mod mapreduce {
    tonic::include_proto!("mapreduce");
}

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

use crate::tasks::{Assignment, JobState};

/// The RPC-facing coordinator. All scheduling state sits behind one
/// coarse mutex; handlers and the monitor lock it, mutate, and release
/// without doing any I/O under the lock.
pub struct MRCoordinator {
    state: Arc<Mutex<JobState>>,
    task_timeout: Duration,
}

impl MRCoordinator {
    pub fn new(input_files: Vec<String>, n_reduce: u32, task_timeout: Duration) -> Self {
        info!(
            n_map = input_files.len(),
            n_reduce, "coordinator initialized"
        );
        MRCoordinator {
            state: Arc::new(Mutex::new(JobState::new(input_files, n_reduce))),
            task_timeout,
        }
    }

    /// Shared handle to the scheduling state, for external `done`
    /// polling alongside the serving task.
    pub fn state(&self) -> Arc<Mutex<JobState>> {
        Arc::clone(&self.state)
    }

    pub async fn done(&self) -> bool {
        self.state.lock().await.done()
    }

    /// Spawn the stale-task monitor: every `interval`, reset tasks that
    /// have been in progress longer than the task timeout back to
    /// pending. This is the sole failure-detection mechanism; there are
    /// no heartbeats. The loop ends once the job is done.
    pub fn start_monitor(&self, interval: Duration) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let timeout = self.task_timeout;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let mut state = state.lock().await;
                if state.done() {
                    break;
                }
                let reclaimed = state.reclaim_expired(Instant::now(), timeout);
                if reclaimed > 0 {
                    warn!(reclaimed, "reset stale in-progress tasks to pending");
                }
            }
        })
    }
}

#[tonic::async_trait]
impl Coordinator for MRCoordinator {
    /// Hand one unit of work to a polling worker, or tell it the job is
    /// done. An empty reply (no task, not done) means everything
    /// claimable is already in flight; the worker polls again.
    async fn get_task(
        &self,
        _request: Request<GetTaskRequest>,
    ) -> Result<Response<GetTaskReply>, Status> {
        let mut state = self.state.lock().await;
        let reply = match state.assign(Instant::now()) {
            Assignment::Map(m) => GetTaskReply {
                map_task: Some(MapTask {
                    input_file: m.input_file,
                    task_number: m.task_number,
                    n_reduce: m.n_reduce,
                }),
                reduce_task: None,
                done: false,
            },
            Assignment::Reduce(r) => GetTaskReply {
                map_task: None,
                reduce_task: Some(ReduceTask {
                    intermediate_files: r.intermediate_files,
                    partition: r.partition,
                    attempt: r.attempt,
                }),
                done: false,
            },
            Assignment::Wait => GetTaskReply {
                map_task: None,
                reduce_task: None,
                done: false,
            },
            Assignment::Done => GetTaskReply {
                map_task: None,
                reduce_task: None,
                done: true,
            },
        };
        Ok(Response::new(reply))
    }

    /// Completion callback. Failures are carried in the result flags,
    /// never as an RPC error; the ack is unconditional.
    async fn perform_task_cb(
        &self,
        request: Request<PerformTaskRequest>,
    ) -> Result<Response<PerformTaskReply>, Status> {
        let args = request.into_inner();
        let mut state = self.state.lock().await;

        if let Some(result) = args.map_result {
            if result.error {
                state.fail_map(&result.input_file, result.task_number);
            } else {
                state.complete_map(
                    &result.input_file,
                    result.task_number,
                    result.intermediate_files,
                );
            }
        }
        if let Some(result) = args.reduce_result {
            if result.error {
                state.fail_reduce(result.partition, result.attempt);
            } else {
                state.complete_reduce(result.partition, result.attempt);
            }
        }

        Ok(Response::new(PerformTaskReply {}))
    }

    async fn echo(&self, request: Request<EchoRequest>) -> Result<Response<EchoReply>, Status> {
        let payload = request.into_inner().payload;
        debug!(%payload, "echo");
        Ok(Response::new(EchoReply { payload }))
    }
}
