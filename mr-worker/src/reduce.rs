//! Reduce-side execution: merge every intermediate file of one
//! partition, group by key, and commit the final output atomically.

use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{error, info};

use common::{codec, utils, ReduceFn};

use crate::core::{ReduceResult, ReduceTask};

/// Execute one reduce task. The temp-file-then-rename commit means a
/// failure or crash anywhere before the rename leaves no partial final
/// output, and a duplicate attempt simply renames over a complete file.
pub fn perform_reduce(task: &ReduceTask, reduce_fn: ReduceFn, work_dir: &Path) -> ReduceResult {
    info!(partition = task.partition, "starting reduce task");
    match run_reduce(task, reduce_fn, work_dir) {
        Ok(()) => ReduceResult {
            partition: task.partition,
            attempt: task.attempt,
            error: false,
        },
        Err(e) => {
            error!(partition = task.partition, "reduce task failed: {e:#}");
            ReduceResult {
                partition: task.partition,
                attempt: task.attempt,
                error: true,
            }
        }
    }
}

fn run_reduce(task: &ReduceTask, reduce_fn: ReduceFn, work_dir: &Path) -> Result<()> {
    let mut records = Vec::new();
    for file in &task.intermediate_files {
        records.extend(codec::read_batch(Path::new(file))?);
    }

    // A stable sort makes equal keys contiguous while preserving the
    // order values were encountered in.
    records.sort_by(|a, b| a.key.cmp(&b.key));

    let mut tmp = NamedTempFile::new_in(work_dir)
        .with_context(|| format!("cannot create temp file in {}", work_dir.display()))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let mut i = 0;
        while i < records.len() {
            let mut j = i + 1;
            while j < records.len() && records[j].key == records[i].key {
                j += 1;
            }
            let values: Vec<String> = records[i..j].iter().map(|kv| kv.value.clone()).collect();
            let output = reduce_fn(&records[i].key, &values).context("reduce function failed")?;
            writeln!(writer, "{} {}", records[i].key, output)?;
            i = j;
        }
        writer.flush().context("cannot flush reduce output")?;
    }

    let final_path = work_dir.join(utils::output_file(task.partition));
    tmp.persist(&final_path)
        .with_context(|| format!("cannot commit {}", final_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use common::KeyValue;

    use super::*;

    fn write_intermediate(dir: &Path, name: &str, records: &[KeyValue]) -> String {
        let path = dir.join(name);
        codec::write_batch(&path, records).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn wc_reduce() -> ReduceFn {
        workload::try_named("wc").unwrap().reduce_fn
    }

    #[test]
    fn reduce_groups_keys_across_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write_intermediate(
                dir.path(),
                "mr-0-0",
                &[KeyValue::new("b", "1"), KeyValue::new("a", "1")],
            ),
            write_intermediate(
                dir.path(),
                "mr-1-0",
                &[KeyValue::new("a", "1"), KeyValue::new("c", "1")],
            ),
        ];
        let task = ReduceTask {
            intermediate_files: files,
            partition: 0,
            attempt: 1,
        };

        let result = perform_reduce(&task, wc_reduce(), dir.path());
        assert!(!result.error);

        let output = fs::read_to_string(dir.path().join("mr-out-0")).unwrap();
        assert_eq!(output, "a 2\nb 1\nc 1\n");
    }

    #[test]
    fn missing_intermediate_file_aborts_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let task = ReduceTask {
            intermediate_files: vec![dir.path().join("mr-9-0").to_string_lossy().into_owned()],
            partition: 0,
            attempt: 1,
        };

        let result = perform_reduce(&task, wc_reduce(), dir.path());
        assert!(result.error);
        assert!(!dir.path().join("mr-out-0").exists());
    }

    #[test]
    fn duplicate_attempts_commit_one_complete_pass() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![write_intermediate(
            dir.path(),
            "mr-0-1",
            &[KeyValue::new("a", "1"), KeyValue::new("a", "1")],
        )];
        let task = ReduceTask {
            intermediate_files: files,
            partition: 1,
            attempt: 1,
        };

        // Two stragglers race on the same partition; whichever renames
        // last, the final file is one complete pass.
        assert!(!perform_reduce(&task, wc_reduce(), dir.path()).error);
        assert!(!perform_reduce(&task, wc_reduce(), dir.path()).error);

        let output = fs::read_to_string(dir.path().join("mr-out-1")).unwrap();
        assert_eq!(output, "a 2\n");
    }

    #[test]
    fn empty_partition_produces_an_empty_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let task = ReduceTask {
            intermediate_files: vec![],
            partition: 2,
            attempt: 1,
        };

        assert!(!perform_reduce(&task, wc_reduce(), dir.path()).error);
        assert_eq!(
            fs::read_to_string(dir.path().join("mr-out-2")).unwrap(),
            ""
        );
    }
}
