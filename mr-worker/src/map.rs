//! Map-side execution: run the application map function over one input
//! file and partition its output into `n_reduce` intermediate files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info};

use common::{codec, partition, utils, KeyValue, MapFn};

use crate::core::{MapResult, MapTask};

/// Execute one map task. Errors never escape: a failure is folded into
/// the result's error flag, and the files it may have partially written
/// are never reported, so the coordinator cannot reference them.
pub fn perform_map(task: &MapTask, map_fn: MapFn, work_dir: &Path) -> MapResult {
    info!(
        input_file = %task.input_file,
        task_number = task.task_number,
        "starting map task"
    );
    match run_map(task, map_fn, work_dir) {
        Ok(files) => MapResult {
            input_file: task.input_file.clone(),
            task_number: task.task_number,
            intermediate_files: files,
            error: false,
        },
        Err(e) => {
            error!(
                input_file = %task.input_file,
                task_number = task.task_number,
                "map task failed: {e:#}"
            );
            MapResult {
                input_file: task.input_file.clone(),
                task_number: task.task_number,
                intermediate_files: vec![],
                error: true,
            }
        }
    }
}

fn run_map(task: &MapTask, map_fn: MapFn, work_dir: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(&task.input_file)
        .with_context(|| format!("cannot read input file {}", task.input_file))?;

    let records = map_fn(&task.input_file, &contents).context("map function failed")?;

    let n_reduce = task.n_reduce as usize;
    let mut buckets: Vec<Vec<KeyValue>> = vec![Vec::new(); n_reduce];
    for kv in records {
        let bucket = partition(&kv.key, task.n_reduce) as usize;
        buckets[bucket].push(kv);
    }

    let mut files = Vec::with_capacity(n_reduce);
    for (bucket, records) in buckets.iter().enumerate() {
        let path = work_dir.join(utils::intermediate_file(task.task_number, bucket as u32));
        codec::write_batch(&path, records)?;
        files.push(path.to_string_lossy().into_owned());
    }
    Ok(files)
}
