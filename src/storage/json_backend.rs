use std::{
    fs,
    path::{Path, PathBuf},
};

use super::KeyValueStore;
use crate::errors::Result;
use crate::utils::fs::write_atomic;

/// File-backed key-value store: one JSON file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", canonical_name(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        write_atomic(&self.path_for(key), value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "book".into()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fs::tmp_path;
    use tempfile::TempDir;

    fn store_with_temp_dir() -> (FileStore, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let store = FileStore::new(temp.path().join("store")).expect("file store");
        (store, temp)
    }

    #[test]
    fn set_get_remove() {
        let (store, _guard) = store_with_temp_dir();
        assert_eq!(store.get("book").unwrap(), None);
        store.set("book", "{\"a\":1}").unwrap();
        assert_eq!(store.get("book").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(!tmp_path(&store.path_for("book")).exists());
        store.remove("book").unwrap();
        assert_eq!(store.get("book").unwrap(), None);
    }

    #[test]
    fn keys_are_sanitized() {
        let (store, _guard) = store_with_temp_dir();
        let path = store.path_for("Cash Flow/2025");
        assert_eq!(path.file_name().unwrap(), "cash_flow_2025.json");
        assert_eq!(
            store.path_for("  ").file_name().unwrap(),
            "book.json"
        );
    }
}
