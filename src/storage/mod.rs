//! Persistence contract for cash flow books.
//!
//! The host keeps its state in a string key-value store (browser
//! `localStorage` or equivalent). This module defines that contract and a
//! repository that serializes a [`CashflowBook`] into it, migrating older
//! snapshots on load.

pub mod json_backend;

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::errors::{RecurrenceError, Result};
use crate::service::{CashflowBook, CURRENT_SCHEMA_VERSION};

pub use json_backend::FileStore;

pub const DEFAULT_BOOK_KEY: &str = "cashflow-book";

/// Abstraction over string key-value backends.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| RecurrenceError::Storage("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Loads, saves and migrates a book stored under a single key.
pub struct BookRepository<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> BookRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_BOOK_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the stored book, or an empty one when nothing was saved yet.
    pub fn load(&self) -> Result<CashflowBook> {
        match self.store.get(&self.key)? {
            Some(raw) => {
                let value: Value = serde_json::from_str(&raw)?;
                migrate(value)
            }
            None => Ok(CashflowBook::new()),
        }
    }

    pub fn save(&self, book: &CashflowBook) -> Result<()> {
        let json = serde_json::to_string(book)?;
        self.store.set(&self.key, &json)?;
        tracing::debug!(
            key = %self.key,
            rules = book.rules.len(),
            transactions = book.transactions.len(),
            "book saved"
        );
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.key)
    }
}

/// Upgrades a raw snapshot to the current schema.
///
/// Schema 0 snapshots have no `schemaVersion` and rules without a
/// generation cursor; the cursor is rebuilt from the instances already
/// present for each series.
pub fn migrate(mut value: Value) -> Result<CashflowBook> {
    let version = value
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    if version > u64::from(CURRENT_SCHEMA_VERSION) {
        return Err(RecurrenceError::Storage(format!(
            "snapshot schema {} is newer than supported schema {}",
            version, CURRENT_SCHEMA_VERSION
        )));
    }
    if version == u64::from(CURRENT_SCHEMA_VERSION) {
        return Ok(serde_json::from_value(value)?);
    }

    if let Some(rules) = value.get_mut("rules").and_then(Value::as_array_mut) {
        for rule in rules.iter_mut().filter_map(Value::as_object_mut) {
            rule.entry("interval").or_insert(Value::from(1));
            rule.entry("active").or_insert(Value::Bool(true));
        }
    }
    let mut book: CashflowBook = serde_json::from_value(value)?;

    for idx in 0..book.rules.len() {
        let rule_id = book.rules[idx].id;
        let existing = book.series(rule_id).len() as u32;
        let rule = &mut book.rules[idx];
        if rule.generated_count < existing {
            rule.generated_count = existing;
        }
        if rule.next_generation.is_none() && rule.active {
            rule.next_generation = rule.occurrence_date(rule.generated_count);
        }
    }
    book.schema_version = CURRENT_SCHEMA_VERSION;
    tracing::info!(from = version, to = CURRENT_SCHEMA_VERSION, "book snapshot migrated");
    Ok(book)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Frequency, RecurrenceRule};
    use crate::transaction::Transaction;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_store_loads_empty_book() {
        let repo = BookRepository::new(MemoryStore::new());
        let book = repo.load().unwrap();
        assert!(book.rules.is_empty());
        assert_eq!(book.schema_version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let repo = BookRepository::new(MemoryStore::new());
        let mut book = CashflowBook::new();
        let start = date(2025, 2, 1);
        book.rules.push(RecurrenceRule::new(
            Transaction::new("Software license", 99.9, start),
            Frequency::Annual,
            start,
        ));
        repo.save(&book).unwrap();
        assert_eq!(repo.load().unwrap(), book);

        repo.clear().unwrap();
        assert!(repo.load().unwrap().rules.is_empty());
    }

    #[test]
    fn legacy_snapshot_gets_cursor_rebuilt() {
        let legacy = serde_json::json!({
            "rules": [{
                "id": "3e6b5f0a-1111-4c2d-9d7e-6a8f0c1b2d33",
                "frequency": "monthly",
                "startDate": "2025-01-10T00:00:00.000Z",
                "template": {
                    "description": "Water bill",
                    "amount": 80.0,
                    "competenciaDate": "2025-01-10T00:00:00.000Z",
                    "dueDate": "2025-01-10T00:00:00.000Z"
                }
            }],
            "transactions": [{
                "description": "Water bill",
                "amount": 80.0,
                "competenciaDate": "2025-01-10T00:00:00.000Z",
                "dueDate": "2025-01-10T00:00:00.000Z",
                "recurrenceId": "3e6b5f0a-1111-4c2d-9d7e-6a8f0c1b2d33",
                "installmentNumber": 1
            }]
        });
        let book = migrate(legacy).unwrap();
        let rule = &book.rules[0];
        assert_eq!(book.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(rule.interval, 1);
        assert!(rule.active);
        assert_eq!(rule.generated_count, 1);
        assert_eq!(rule.next_generation, Some(date(2025, 2, 10)));
    }

    #[test]
    fn newer_schema_is_rejected() {
        let snapshot = serde_json::json!({ "schemaVersion": CURRENT_SCHEMA_VERSION + 1 });
        assert!(matches!(
            migrate(snapshot),
            Err(RecurrenceError::Storage(_))
        ));
    }
}
