use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Synchronous string key-value storage, the substrate favorites and the
/// session live in.
pub trait KeyValueStore {
    type Error;
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

const LOCAL_STORAGE: &'static [u8] = b"local_storage";

impl KeyValueStore for sled::Db {
    type Error = sled::Error;

    fn get(&self, key: &str) -> sled::Result<Option<String>> {
        let tree = self.open_tree(LOCAL_STORAGE)?;
        match tree.get(key.as_bytes())? {
            Some(value) => String::from_utf8(value.to_vec()).map(Some).map_err(|err| {
                sled::Error::Unsupported(format!("value of {} is not valid UTF-8: {}", key, err))
            }),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> sled::Result<()> {
        let tree = self.open_tree(LOCAL_STORAGE)?;
        tree.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> sled::Result<()> {
        let tree = self.open_tree(LOCAL_STORAGE)?;
        tree.remove(key.as_bytes())?;
        Ok(())
    }
}

impl<'a, S: KeyValueStore + ?Sized> KeyValueStore for &'a S {
    type Error = S::Error;

    fn get(&self, key: &str) -> Result<Option<String>, S::Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), S::Error> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), S::Error> {
        (**self).remove(key)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MemoryStorageError {
    #[error("storage quota exceeded writing {key}: {needed} bytes needed, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },
}

/// In-memory storage. Counts writes and can enforce a byte quota over the sum
/// of key and value lengths.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
    quota: Option<usize>,
    writes: Cell<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        MemoryStorage {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Number of `set` and `remove` calls made, including rejected ones.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStorage {
    type Error = MemoryStorageError;

    fn get(&self, key: &str) -> Result<Option<String>, MemoryStorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MemoryStorageError> {
        self.writes.set(self.writes.get() + 1);
        if let Some(quota) = self.quota {
            let available = quota.saturating_sub(self.used_without(key));
            let needed = key.len() + value.len();
            if needed > available {
                return Err(MemoryStorageError::QuotaExceeded {
                    key: key.to_owned(),
                    needed,
                    available,
                });
            }
        }
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MemoryStorageError> {
        self.writes.set(self.writes.get() + 1);
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sled_round_trip() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        assert_eq!(db.get("favorites_alice").unwrap(), None);
        db.set("favorites_alice", "[]").unwrap();
        assert_eq!(db.get("favorites_alice").unwrap().as_deref(), Some("[]"));
        db.set("favorites_alice", "[{\"id\":1}]").unwrap();
        assert_eq!(
            db.get("favorites_alice").unwrap().as_deref(),
            Some("[{\"id\":1}]")
        );
        db.remove("favorites_alice").unwrap();
        assert_eq!(db.get("favorites_alice").unwrap(), None);
    }

    #[test]
    fn sled_rejects_invalid_utf8() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        db.open_tree(LOCAL_STORAGE)
            .unwrap()
            .insert("favorites_alice", &b"[\"A\xff\"]"[..])
            .unwrap();
        match db.get("favorites_alice") {
            Err(sled::Error::Unsupported(message)) => assert!(message.contains("favorites_alice")),
            other => panic!("expected a read error, got {:?}", other),
        }
    }

    #[test]
    fn sled_keeps_to_its_own_tree() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        db.set("user", "{}").unwrap();
        assert_eq!(sled::Tree::get(&db, "user").unwrap(), None);
    }

    #[test]
    fn memory_quota() {
        let storage = MemoryStorage::with_quota(16);
        storage.set("a", "0123456789").unwrap();
        // Overwriting a key only counts the new value.
        storage.set("a", "0123456789abcde").unwrap();
        let err = storage.set("b", "xy").unwrap_err();
        assert_eq!(
            err,
            MemoryStorageError::QuotaExceeded {
                key: "b".to_owned(),
                needed: 3,
                available: 0,
            }
        );
        assert_eq!(storage.get("b").unwrap(), None);
        assert_eq!(storage.writes(), 3);

        storage.remove("a").unwrap();
        assert!(storage.is_empty());
    }
}
