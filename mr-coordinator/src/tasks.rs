//! Per-task records and the job's scheduling state machine.
//!
//! [`JobState`] is pure in-memory state with no locking of its own; the
//! RPC layer serializes every mutation behind one mutex so that each
//! decision (claiming, completing, reclaiming) sees a consistent global
//! view. Each dispatch is a lease: the assignment carries an attempt
//! epoch, and results from an attempt that is no longer live are
//! rejected rather than committed twice.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// One task record. `attempt` is bumped on every dispatch and is the
/// epoch a completion callback must match to be accepted. `Failed`
/// tasks are claimable again immediately, exactly like `Pending` ones.
#[derive(Debug, Clone)]
pub struct Task {
    status: TaskStatus,
    started_at: Option<Instant>,
    attempt: u64,
}

impl Task {
    fn new() -> Self {
        Task {
            status: TaskStatus::Pending,
            started_at: None,
            attempt: 0,
        }
    }

    fn claimable(&self) -> bool {
        matches!(self.status, TaskStatus::Pending | TaskStatus::Failed)
    }

    fn expired(&self, now: Instant, timeout: Duration) -> bool {
        self.status == TaskStatus::InProgress
            && self
                .started_at
                .is_some_and(|started| now.saturating_duration_since(started) > timeout)
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }
}

/// A dispatched map assignment. The task number is monotonic across all
/// map dispatches, so it doubles as the attempt epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapAssignment {
    pub input_file: String,
    pub task_number: u32,
    pub n_reduce: u32,
}

/// A dispatched reduce assignment over every intermediate file the
/// completed map tasks contributed to one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceAssignment {
    pub intermediate_files: Vec<String>,
    pub partition: u32,
    pub attempt: u64,
}

/// Outcome of one assignment scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Map(MapAssignment),
    Reduce(ReduceAssignment),
    /// Nothing is claimable right now but the job is not finished; the
    /// caller should poll again.
    Wait,
    /// Every map and reduce task has completed.
    Done,
}

/// All scheduling state for one job.
pub struct JobState {
    map_tasks: HashMap<String, Task>,
    reduce_tasks: HashMap<u32, Task>,
    /// partition -> intermediate files contributed by accepted map
    /// completions. Grow-only.
    intermediate_files: HashMap<u32, Vec<String>>,
    next_map_number: u32,
    n_reduce: u32,
}

impl JobState {
    pub fn new(input_files: Vec<String>, n_reduce: u32) -> Self {
        let map_tasks = input_files
            .into_iter()
            .map(|file| (file, Task::new()))
            .collect();
        let reduce_tasks = (0..n_reduce).map(|p| (p, Task::new())).collect();
        JobState {
            map_tasks,
            reduce_tasks,
            intermediate_files: HashMap::new(),
            next_map_number: 0,
            n_reduce,
        }
    }

    pub fn n_reduce(&self) -> u32 {
        self.n_reduce
    }

    /// True iff every map and every reduce task has completed.
    pub fn done(&self) -> bool {
        self.map_tasks
            .values()
            .chain(self.reduce_tasks.values())
            .all(|t| t.status == TaskStatus::Completed)
    }

    /// Claim at most one unit of work. Map tasks are claimed first; a
    /// reduce task is only claimable once every map task has completed,
    /// since its assignment snapshots the full intermediate file list
    /// for the partition. Which claimable task wins is iteration order,
    /// deliberately unspecified.
    pub fn assign(&mut self, now: Instant) -> Assignment {
        let mut all_maps_completed = true;
        let mut claim: Option<String> = None;
        for (file, task) in &self.map_tasks {
            if task.status != TaskStatus::Completed {
                all_maps_completed = false;
            }
            if claim.is_none() && task.claimable() {
                claim = Some(file.clone());
            }
        }

        if let Some(file) = claim {
            let task_number = self.next_map_number;
            self.next_map_number += 1;
            if let Some(task) = self.map_tasks.get_mut(&file) {
                task.status = TaskStatus::InProgress;
                task.started_at = Some(now);
                task.attempt = u64::from(task_number);
            }
            debug!(%file, task_number, "dispatching map task");
            return Assignment::Map(MapAssignment {
                input_file: file,
                task_number,
                n_reduce: self.n_reduce,
            });
        }

        if !all_maps_completed {
            return Assignment::Wait;
        }

        let claim = self
            .reduce_tasks
            .iter()
            .find(|(_, task)| task.claimable())
            .map(|(p, _)| *p);
        if let Some(partition) = claim {
            if let Some(task) = self.reduce_tasks.get_mut(&partition) {
                task.status = TaskStatus::InProgress;
                task.started_at = Some(now);
                task.attempt += 1;
                let attempt = task.attempt;
                debug!(partition, attempt, "dispatching reduce task");
                return Assignment::Reduce(ReduceAssignment {
                    intermediate_files: self
                        .intermediate_files
                        .get(&partition)
                        .cloned()
                        .unwrap_or_default(),
                    partition,
                    attempt,
                });
            }
        }

        if self.done() {
            Assignment::Done
        } else {
            Assignment::Wait
        }
    }

    /// Commit a successful map attempt. Stale attempts (the lease
    /// already expired or the task was re-dispatched) are ignored so
    /// their files never enter the intermediate table.
    pub fn complete_map(&mut self, input_file: &str, task_number: u32, files: Vec<String>) {
        let Some(task) = self.map_tasks.get_mut(input_file) else {
            warn!(%input_file, "completion for unknown map task");
            return;
        };
        if task.status != TaskStatus::InProgress || task.attempt != u64::from(task_number) {
            warn!(%input_file, task_number, "ignoring stale map completion");
            return;
        }
        task.status = TaskStatus::Completed;
        task.started_at = None;
        for (partition, file) in files.into_iter().enumerate() {
            self.intermediate_files
                .entry(partition as u32)
                .or_default()
                .push(file);
        }
        info!(%input_file, task_number, "map task completed");
    }

    /// Record a failed map attempt; the task becomes claimable again
    /// immediately, with no backoff.
    pub fn fail_map(&mut self, input_file: &str, task_number: u32) {
        let Some(task) = self.map_tasks.get_mut(input_file) else {
            warn!(%input_file, "failure report for unknown map task");
            return;
        };
        if task.status != TaskStatus::InProgress || task.attempt != u64::from(task_number) {
            warn!(%input_file, task_number, "ignoring stale map failure");
            return;
        }
        task.status = TaskStatus::Failed;
        task.started_at = None;
        warn!(%input_file, task_number, "map task failed, will retry");
    }

    /// Commit a successful reduce attempt.
    pub fn complete_reduce(&mut self, partition: u32, attempt: u64) {
        let Some(task) = self.reduce_tasks.get_mut(&partition) else {
            warn!(partition, "completion for unknown reduce task");
            return;
        };
        if task.status != TaskStatus::InProgress || task.attempt != attempt {
            warn!(partition, attempt, "ignoring stale reduce completion");
            return;
        }
        task.status = TaskStatus::Completed;
        task.started_at = None;
        info!(partition, "reduce task completed");
    }

    /// Record a failed reduce attempt.
    pub fn fail_reduce(&mut self, partition: u32, attempt: u64) {
        let Some(task) = self.reduce_tasks.get_mut(&partition) else {
            warn!(partition, "failure report for unknown reduce task");
            return;
        };
        if task.status != TaskStatus::InProgress || task.attempt != attempt {
            warn!(partition, attempt, "ignoring stale reduce failure");
            return;
        }
        task.status = TaskStatus::Failed;
        task.started_at = None;
        warn!(partition, "reduce task failed, will retry");
    }

    /// Lease reclamation: reset every in-progress task that has been
    /// running longer than `timeout` back to `Pending`, making it
    /// eligible for reassignment. Returns how many were reclaimed.
    pub fn reclaim_expired(&mut self, now: Instant, timeout: Duration) -> usize {
        let mut reclaimed = 0;
        let tasks = self
            .map_tasks
            .values_mut()
            .chain(self.reduce_tasks.values_mut());
        for task in tasks {
            if task.expired(now, timeout) {
                task.status = TaskStatus::Pending;
                task.started_at = None;
                reclaimed += 1;
            }
        }
        reclaimed
    }

    /// Intermediate files recorded so far for one partition.
    pub fn intermediate_files(&self, partition: u32) -> &[String] {
        self.intermediate_files
            .get(&partition)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn map_task_status(&self, input_file: &str) -> Option<TaskStatus> {
        self.map_tasks.get(input_file).map(Task::status)
    }

    pub fn reduce_task_status(&self, partition: u32) -> Option<TaskStatus> {
        self.reduce_tasks.get(&partition).map(Task::status)
    }
}
