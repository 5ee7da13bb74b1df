//! Built-in MapReduce applications.
//!
//! Each module exposes a `map` and a `reduce` function matching the
//! types in [`common`]; [`try_named`] is how binaries select one at
//! startup in place of a dynamically loaded plugin.

use common::Workload;

pub mod vertex_degree;
pub mod wc;

/// Look up a built-in workload by name.
pub fn try_named(name: &str) -> Option<Workload> {
    match name {
        "wc" => Some(Workload {
            map_fn: wc::map,
            reduce_fn: wc::reduce,
        }),
        "vertex-degree" => Some(Workload {
            map_fn: vertex_degree::map,
            reduce_fn: vertex_degree::reduce,
        }),
        _ => None,
    }
}
