//! The MapReduce worker.
//!
//! A worker is anonymous and crash-oblivious: it polls the coordinator
//! for one task at a time, runs it against the local shared filesystem,
//! reports the outcome, and exits once the coordinator says the job is
//! done. There is no internal concurrency and no worker-to-worker
//! communication.

pub mod core;
pub mod map;
pub mod reduce;
