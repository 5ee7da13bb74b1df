//! The classic word-count application: emit `(word, "1")` per word,
//! sum the counts per word in reduce.

use anyhow::Result;

use common::KeyValue;

pub fn map(_filename: &str, contents: &str) -> Result<Vec<KeyValue>> {
    let words = contents
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty());
    Ok(words.map(|w| KeyValue::new(w, "1")).collect())
}

pub fn reduce(_key: &str, values: &[String]) -> Result<String> {
    let mut count = 0u64;
    for value in values {
        count += value.parse::<u64>()?;
    }
    Ok(count.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_splits_on_non_alphanumerics() {
        let kvs = map("in.txt", "a b, a!\nc").unwrap();
        let keys: Vec<&str> = kvs.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "a", "c"]);
        assert!(kvs.iter().all(|kv| kv.value == "1"));
    }

    #[test]
    fn reduce_sums_the_counts() {
        let values = vec!["1".to_string(), "1".to_string(), "2".to_string()];
        assert_eq!(reduce("a", &values).unwrap(), "4");
    }

    #[test]
    fn reduce_rejects_garbage_counts() {
        assert!(reduce("a", &["one".to_string()]).is_err());
    }
}
