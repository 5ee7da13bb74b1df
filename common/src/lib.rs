//! Types shared between the MapReduce coordinator and its workers.
//!
//! Users supply a map and a reduce function; the engine distributes one
//! map task per input file and one reduce task per output partition to
//! workers over RPC. All data lives on a filesystem shared by every
//! process in the job.

use std::fmt;
use std::fmt::Formatter;
use std::hash::Hasher;

use serde::{Deserialize, Serialize};

pub mod codec;
pub mod utils;

/////////////////////////////////////////////////////////////////////////////
// MapReduce application types
/////////////////////////////////////////////////////////////////////////////

/// A map function takes the input file name and its full contents and
/// returns the emitted key-value pairs.
pub type MapFn = fn(filename: &str, contents: &str) -> anyhow::Result<Vec<KeyValue>>;

/// A reduce function takes a key and every value emitted for that key
/// within one partition, and returns a single output value.
pub type ReduceFn = fn(key: &str, values: &[String]) -> anyhow::Result<String>;

/// A map reduce application.
#[derive(Copy, Clone)]
pub struct Workload {
    pub map_fn: MapFn,
    pub reduce_fn: ReduceFn,
}

/////////////////////////////////////////////////////////////////////////////
// Key-value pairs
/////////////////////////////////////////////////////////////////////////////

/// A single key-value pair, the unit exchanged between map output and
/// reduce input. Persisted in intermediate files via [`codec`].
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct KeyValue {
    /// The key.
    pub key: String,

    /// The value.
    pub value: String,
}

impl KeyValue {
    /// Construct a new key-value pair from the given key and value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key, self.value)
    }
}

/////////////////////////////////////////////////////////////////////////////
// Partitioning
/////////////////////////////////////////////////////////////////////////////

/// Hashes an intermediate key. FNV-1a masked to the non-negative range,
/// so the value is stable across workers and runs.
pub fn ihash(key: &[u8]) -> u32 {
    let mut hasher = fnv::FnvHasher::with_key(0);
    hasher.write(key);
    (hasher.finish() & 0x7fffffff) as u32
}

/// Compute the reduce bucket for a key: `ihash(key) % n_reduce`.
pub fn partition(key: &str, n_reduce: u32) -> u32 {
    ihash(key.as_bytes()) % n_reduce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ihash_is_deterministic_and_non_negative() {
        for key in ["", "a", "abc", "the quick brown fox"] {
            let first = ihash(key.as_bytes());
            assert_eq!(first, ihash(key.as_bytes()));
            assert!(first <= 0x7fffffff);
        }
    }

    #[test]
    fn partition_stays_in_range() {
        for n_reduce in [1, 2, 7, 10] {
            for key in ["a", "b", "word"] {
                assert!(partition(key, n_reduce) < n_reduce);
            }
        }
    }

    #[test]
    fn equal_keys_share_a_partition() {
        assert_eq!(partition("apple", 5), partition("apple", 5));
        assert_eq!(partition("apple", 5), partition(&"apple".to_string(), 5));
    }
}
