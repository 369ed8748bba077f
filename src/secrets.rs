use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const SECRETS_FILE_NAME: &str = "secrets.json";

/// Opaque key -> string storage for credential material, keyed by recipe
/// id. Config objects never embed secret values; they reference them
/// through this store.
///
/// The array variants share the key with the single-value variants: the
/// array is stored as its JSON encoding under the same id.
pub trait SecretStore {
    fn get_secret(&self, secret_id: &str) -> Result<Option<String>>;
    fn save_secret(&mut self, secret_id: &str, value: &str) -> Result<()>;
    fn delete_secret(&mut self, secret_id: &str) -> Result<()>;

    /// Decode the stored value as a JSON string array. Missing, empty, or
    /// undecodable input normalizes to an empty sequence — never an error.
    fn get_secret_array(&self, secret_id: &str) -> Result<Vec<String>> {
        let raw = match self.get_secret(secret_id)? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(Vec::new()),
        };
        Ok(serde_json::from_str(&raw).unwrap_or_default())
    }

    fn save_secret_array(&mut self, secret_id: &str, values: &[String]) -> Result<()> {
        let json = serde_json::to_string(values)
            .map_err(|e| Error::storage(format!("Failed to encode secret array: {}", e)))?;
        self.save_secret(secret_id, &json)
    }
}

// ---------------------------------------------------------------------------
// In-memory backend.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    values: HashMap<String, String>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn get_secret(&self, secret_id: &str) -> Result<Option<String>> {
        Ok(self.values.get(secret_id).cloned())
    }

    fn save_secret(&mut self, secret_id: &str, value: &str) -> Result<()> {
        self.values.insert(secret_id.to_string(), value.to_string());
        Ok(())
    }

    fn delete_secret(&mut self, secret_id: &str) -> Result<()> {
        self.values.remove(secret_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File backend — one JSON map per data dir, written through on every save.
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FileSecretStore {
    /// Open (or create) the secret file under `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(SECRETS_FILE_NAME);
        let values = if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|e| Error::storage(format!("Failed to read secrets: {}", e)))?;
            serde_json::from_str(&contents)
                .map_err(|e| Error::storage(format!("Failed to parse secrets: {}", e)))?
        } else {
            HashMap::new()
        };
        Ok(Self { path, values })
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::storage(format!("Failed to create secrets dir: {}", e)))?;
        }
        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| Error::storage(format!("Failed to serialize secrets: {}", e)))?;
        fs::write(&self.path, json)
            .map_err(|e| Error::storage(format!("Failed to write secrets: {}", e)))
    }
}

impl SecretStore for FileSecretStore {
    fn get_secret(&self, secret_id: &str) -> Result<Option<String>> {
        Ok(self.values.get(secret_id).cloned())
    }

    fn save_secret(&mut self, secret_id: &str, value: &str) -> Result<()> {
        self.values.insert(secret_id.to_string(), value.to_string());
        self.persist()
    }

    fn delete_secret(&mut self, secret_id: &str) -> Result<()> {
        if self.values.remove(secret_id).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_single_value() {
        let mut store = MemorySecretStore::new();
        assert_eq!(store.get_secret("r1").unwrap(), None);

        store.save_secret("r1", "token").unwrap();
        assert_eq!(store.get_secret("r1").unwrap().as_deref(), Some("token"));

        store.delete_secret("r1").unwrap();
        assert_eq!(store.get_secret("r1").unwrap(), None);
    }

    #[test]
    fn test_array_missing_normalizes_to_empty() {
        let store = MemorySecretStore::new();
        assert!(store.get_secret_array("nope").unwrap().is_empty());
    }

    #[test]
    fn test_array_invalid_json_normalizes_to_empty() {
        let mut store = MemorySecretStore::new();
        store.save_secret("r1", "not json").unwrap();
        assert!(store.get_secret_array("r1").unwrap().is_empty());
    }

    #[test]
    fn test_array_roundtrip_preserves_order() {
        let mut store = MemorySecretStore::new();
        let values = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        store.save_secret_array("r1", &values).unwrap();
        assert_eq!(store.get_secret_array("r1").unwrap(), values);

        // Same key as the single-value variant.
        let raw = store.get_secret("r1").unwrap().unwrap();
        assert_eq!(raw, r#"["b","a","c"]"#);
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = FileSecretStore::open(dir.path()).unwrap();
            store.save_secret("r1", "token").unwrap();
            store
                .save_secret_array("r2", &["x".to_string(), "y".to_string()])
                .unwrap();
        }

        let store = FileSecretStore::open(dir.path()).unwrap();
        assert_eq!(store.get_secret("r1").unwrap().as_deref(), Some("token"));
        assert_eq!(
            store.get_secret_array("r2").unwrap(),
            vec!["x".to_string(), "y".to_string()]
        );
    }

    #[test]
    fn test_file_store_delete_missing_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileSecretStore::open(dir.path()).unwrap();
        store.delete_secret("never-saved").unwrap();
    }
}
