//! A MapReduce-compatible application that computes the
//! degree of each vertex in a graph, given a list of edges.

use anyhow::{anyhow, Result};

use common::KeyValue;

fn parse_line(line: &str) -> Result<(u64, u64)> {
    let mut iter = line.split_whitespace().take(2);
    let a = iter
        .next()
        .ok_or_else(|| anyhow!("Invalid input file format"))?
        .parse()?;
    let b = iter
        .next()
        .ok_or_else(|| anyhow!("Invalid input file format"))?
        .parse()?;
    Ok((a, b))
}

pub fn map(_filename: &str, contents: &str) -> Result<Vec<KeyValue>> {
    let edges = contents
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(parse_line)
        .collect::<Result<Vec<_>>>()?;

    let mut out = Vec::with_capacity(edges.len() * 2);
    for (a, b) in edges {
        out.push(KeyValue::new(a.to_string(), "1"));
        out.push(KeyValue::new(b.to_string(), "1"));
    }
    Ok(out)
}

pub fn reduce(_key: &str, values: &[String]) -> Result<String> {
    let mut degree = 0u64;
    for value in values {
        degree += value.parse::<u64>()?;
    }
    Ok(degree.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_edge_contributes_to_both_endpoints() {
        let kvs = map("edges.txt", "1 2\n2 3\n").unwrap();
        let keys: Vec<&str> = kvs.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, ["1", "2", "2", "3"]);
    }

    #[test]
    fn malformed_edge_is_an_error() {
        assert!(map("edges.txt", "1\n").is_err());
    }
}
