//! The MapReduce coordinator.
//!
//! Owns every task record for one job and hands out units of work to
//! polling workers over RPC. Failed or silent workers are never
//! detected directly; their tasks are reclaimed by the stale-task
//! monitor once the assignment lease times out.

pub mod core;
pub mod tasks;
