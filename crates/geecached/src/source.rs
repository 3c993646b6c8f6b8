//! Backing data source loaded from a JSON seed file

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geecache::{BoxError, Getter};
use serde::Deserialize;
use tracing::info;

/// Seed values may be written as JSON strings or numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeedValue {
    Text(String),
    Number(serde_json::Number),
}

impl SeedValue {
    fn into_bytes(self) -> Vec<u8> {
        match self {
            SeedValue::Text(s) => s.into_bytes(),
            SeedValue::Number(n) => n.to_string().into_bytes(),
        }
    }
}

/// In-memory stand-in for a slow database
#[derive(Debug)]
pub struct SeedSource {
    entries: HashMap<String, Vec<u8>>,
}

impl SeedSource {
    /// Load a JSON object mapping keys to values
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading seed file {}", path.display()))?;
        let parsed: HashMap<String, SeedValue> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing seed file {}", path.display()))?;

        Ok(Self {
            entries: parsed
                .into_iter()
                .map(|(key, value)| (key, value.into_bytes()))
                .collect(),
        })
    }

    /// The built-in demo table
    pub fn demo() -> Self {
        let entries = [("Tom", "630"), ("Jack", "589"), ("Sam", "567")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect();
        Self { entries }
    }

    /// Number of keys the source can answer
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Getter for SeedSource {
    fn get(&self, key: &str) -> std::result::Result<Vec<u8>, BoxError> {
        info!("[SlowDB] search key {}", key);
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| format!("{} not exist", key).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_strings_and_numbers() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"Tom": "630", "Jack": 589}}"#).unwrap();

        let source = SeedSource::load(file.path()).unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(source.get("Tom").unwrap(), b"630");
        assert_eq!(source.get("Jack").unwrap(), b"589");
        assert_eq!(source.get("Sam").unwrap_err().to_string(), "Sam not exist");
    }

    #[test]
    fn test_load_rejects_non_object() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"["Tom", "630"]"#).unwrap();

        let err = SeedSource::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing seed file"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SeedSource::load(dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_demo_table() {
        let source = SeedSource::demo();
        assert_eq!(source.get("Sam").unwrap(), b"567");
    }
}
