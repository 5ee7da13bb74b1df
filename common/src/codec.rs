//! Encoding of intermediate key-value batches.
//!
//! Each intermediate file holds the complete bucket a single map attempt
//! produced for one partition, written as one JSON array. A file is read
//! back in full by the reducer; this is deliberately a batch format, not
//! a streaming one.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::KeyValue;

/// Write one bucket of records as a single encoded batch.
pub fn write_batch(path: &Path, records: &[KeyValue]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create intermediate file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, records)
        .with_context(|| format!("cannot encode records into {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("cannot flush {}", path.display()))?;
    Ok(())
}

/// Read a batch written by [`write_batch`].
pub fn read_batch(path: &Path) -> Result<Vec<KeyValue>> {
    let file = File::open(path)
        .with_context(|| format!("cannot open intermediate file {}", path.display()))?;
    let records = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot decode records from {}", path.display()))?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_survives_a_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mr-0-0");

        let records = vec![KeyValue::new("a", "1"), KeyValue::new("b", "1")];
        write_batch(&path, &records).unwrap();
        assert_eq!(read_batch(&path).unwrap(), records);
    }

    #[test]
    fn empty_bucket_decodes_to_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mr-0-1");

        write_batch(&path, &[]).unwrap();
        assert!(read_batch(&path).unwrap().is_empty());
    }

    #[test]
    fn truncated_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mr-0-2");
        std::fs::write(&path, b"[{\"key\":\"a\"").unwrap();

        assert!(read_batch(&path).is_err());
    }
}
