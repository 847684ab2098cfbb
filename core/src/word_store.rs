//! Persistence for learned words.
//!
//! Learning dictionaries keep their working set in memory and hand batches of
//! changes to a [`WordStore`]. Entries are keyed by `(locale, word)`; a batch
//! entry with a `None` frequency deletes the word.
//!
//! Two backends are provided:
//! - `MemoryWordStore`: thread-safe map, used in tests and when no storage
//!   path is configured.
//! - `RedbWordStore`: persistent, ACID-backed storage using `redb`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use redb::{ReadableTable, TableDefinition};

use crate::error::Result;

/// One pending change: `Some(frequency)` upserts, `None` deletes.
pub type WordUpdate = (String, Option<i32>);

pub trait WordStore: Send + Sync {
    /// All stored words for `locale`.
    fn load(&self, locale: &str) -> Result<Vec<(String, i32)>>;

    /// Apply a batch of changes, each as delete-then-insert-if-present.
    fn apply(&self, locale: &str, batch: &[WordUpdate]) -> Result<()>;
}

/// In-memory store shared between clones.
#[derive(Clone, Debug, Default)]
pub struct MemoryWordStore {
    inner: Arc<RwLock<HashMap<(String, String), i32>>>,
}

impl MemoryWordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored frequency for `(locale, word)`.
    pub fn frequency(&self, locale: &str, word: &str) -> Option<i32> {
        let map = self.inner.read().ok()?;
        map.get(&(locale.to_string(), word.to_string())).copied()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WordStore for MemoryWordStore {
    fn load(&self, locale: &str) -> Result<Vec<(String, i32)>> {
        let Ok(map) = self.inner.read() else {
            return Ok(Vec::new());
        };
        let mut words: Vec<(String, i32)> = map
            .iter()
            .filter(|((l, _), _)| l == locale)
            .map(|((_, w), f)| (w.clone(), *f))
            .collect();
        words.sort();
        Ok(words)
    }

    fn apply(&self, locale: &str, batch: &[WordUpdate]) -> Result<()> {
        if let Ok(mut map) = self.inner.write() {
            for (word, frequency) in batch {
                let key = (locale.to_string(), word.clone());
                map.remove(&key);
                if let Some(f) = frequency {
                    map.insert(key, *f);
                }
            }
        }
        Ok(())
    }
}

/// Redb-backed word store. Each learning dictionary uses its own table.
pub struct RedbWordStore {
    db: redb::Database,
    table: TableDefinition<'static, (&'static str, &'static str), u32>,
    #[allow(dead_code)]
    path: PathBuf,
}

impl RedbWordStore {
    /// Table for words learned by the auto dictionary.
    pub const AUTO_WORDS: &'static str = "auto_words";
    /// Table for words in the user dictionary.
    pub const USER_WORDS: &'static str = "user_words";
    /// Table for learned word pairs.
    pub const USER_BIGRAMS: &'static str = "user_bigrams";

    /// Create or open a database at `path`, using table `table`.
    pub fn open<P: AsRef<Path>>(path: P, table: &'static str) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let db = redb::Database::create(path.as_ref())?;
        Ok(Self {
            db,
            table: TableDefinition::new(table),
            path: path.as_ref().to_path_buf(),
        })
    }
}

impl WordStore for RedbWordStore {
    fn load(&self, locale: &str) -> Result<Vec<(String, i32)>> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(self.table) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            let (stored_locale, word) = key.value();
            if stored_locale == locale {
                out.push((word.to_string(), value.value() as i32));
            }
        }
        Ok(out)
    }

    fn apply(&self, locale: &str, batch: &[WordUpdate]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(self.table)?;
            for (word, frequency) in batch {
                table.remove((locale, word.as_str()))?;
                if let Some(f) = frequency {
                    table.insert((locale, word.as_str()), (*f).max(0) as u32)?;
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(entries: &[(&str, Option<i32>)]) -> Vec<WordUpdate> {
        entries.iter().map(|(w, f)| (w.to_string(), *f)).collect()
    }

    #[test]
    fn memory_store_upserts_and_deletes() {
        let store = MemoryWordStore::new();
        store.apply("en_US", &batch(&[("hello", Some(3)), ("bye", Some(1))])).unwrap();
        store.apply("en_US", &batch(&[("hello", Some(4)), ("bye", None)])).unwrap();
        assert_eq!(store.frequency("en_US", "hello"), Some(4));
        assert_eq!(store.frequency("en_US", "bye"), None);
    }

    #[test]
    fn memory_store_filters_by_locale() {
        let store = MemoryWordStore::new();
        store.apply("en_US", &batch(&[("color", Some(2))])).unwrap();
        store.apply("en_GB", &batch(&[("colour", Some(2))])).unwrap();
        assert_eq!(store.load("en_GB").unwrap(), vec![("colour".to_string(), 2)]);
    }

    #[test]
    fn redb_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.redb");
        {
            let store = RedbWordStore::open(&path, RedbWordStore::AUTO_WORDS).unwrap();
            assert!(store.load("en_US").unwrap().is_empty());
            store
                .apply("en_US", &batch(&[("keyboard", Some(5)), ("typo", Some(1))]))
                .unwrap();
            store.apply("en_US", &batch(&[("typo", None)])).unwrap();
        }
        let store = RedbWordStore::open(&path, RedbWordStore::AUTO_WORDS).unwrap();
        assert_eq!(store.load("en_US").unwrap(), vec![("keyboard".to_string(), 5)]);
        assert!(store.load("fr_FR").unwrap().is_empty());
    }
}
