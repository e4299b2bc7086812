//! The persisted parameter store: the external key/value system deployment
//! results are cached in between runs.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use serde_json::Value as Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("parameter store i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("parameter {0:?} holds invalid JSON: {1}")]
    Json(String, #[source] serde_json::Error),
    #[error("parameter {0:?} already exists and overwrite was not requested")]
    AlreadyExists(String),
    #[error("parameter store: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PutOptions {
    pub encrypted: bool,
    pub overwrite: bool,
}

impl PutOptions {
    pub fn overwrite() -> Self {
        PutOptions {
            encrypted: false,
            overwrite: true,
        }
    }
}

/// Request/response access to the external parameter store. No locking:
/// correctness across retried runs comes from the cache check, not from
/// coordination here.
#[async_trait]
pub trait ParamStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn get_json(&self, key: &str) -> Result<Option<Json>, StoreError> {
        match self.get(key).await? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StoreError::Json(key.to_string(), e)),
        }
    }

    async fn put(&self, key: &str, value: &str, opts: PutOptions) -> Result<(), StoreError>;

    /// Keys (not values) whose name starts with `prefix`.
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Key naming for everything the orchestrator persists under one deployment
/// name prefix.
#[derive(Debug, Clone)]
pub struct ParamKeys {
    prefix: String,
}

impl ParamKeys {
    pub fn new(prefix: &str) -> Self {
        ParamKeys {
            prefix: prefix.to_string(),
        }
    }

    pub fn name_prefix(&self) -> &str {
        &self.prefix
    }

    /// Key holding the deployed address of the named contract.
    pub fn sc_addr(&self, name: &str) -> String {
        format!("sv-{}-param-sc-addr-{}", self.prefix, name)
    }

    /// Key holding the JSON-encoded inputs the contract was deployed with.
    pub fn sc_inputs(&self, name: &str) -> String {
        format!("sv-{}-param-sc-inputs-{}", self.prefix, name)
    }

    pub fn sc_addr_prefix(&self) -> String {
        self.sc_addr("")
    }

    pub fn sc_inputs_prefix(&self) -> String {
        self.sc_inputs("")
    }

    pub fn physical_id(&self) -> String {
        format!("sv-{}-chaincode-2-cr", self.prefix)
    }
}

/// A parameter store backed by a single JSON file on disk.
///
/// Stands in for the cloud parameter service in local and test deployments.
/// The `encrypted` put option is advisory here; the file store persists
/// everything in the clear.
pub struct FileParamStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileParamStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)
                .map_err(|e| StoreError::Json(path.display().to_string(), e))?
        } else {
            BTreeMap::new()
        };
        Ok(FileParamStore {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Json(self.path.display().to_string(), e))?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned lock means a writer panicked; the map itself is still
        // consistent, so recover the guard.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ParamStore for FileParamStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.lock().contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str, opts: PutOptions) -> Result<(), StoreError> {
        let mut entries = self.lock();
        if !opts.overwrite && entries.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .lock()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.lock();
        entries.remove(key);
        self.flush(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_round_trips_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");

        let store = FileParamStore::open(&path).unwrap();
        store
            .put("sv-test-param-sc-addr-a", "0x1234", PutOptions::overwrite())
            .await
            .unwrap();
        drop(store);

        let store = FileParamStore::open(&path).unwrap();
        assert!(store.exists("sv-test-param-sc-addr-a").await.unwrap());
        assert_eq!(
            store.get("sv-test-param-sc-addr-a").await.unwrap().as_deref(),
            Some("0x1234")
        );
    }

    #[tokio::test]
    async fn put_without_overwrite_rejects_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileParamStore::open(dir.path().join("params.json")).unwrap();

        store.put("k", "v1", PutOptions::overwrite()).await.unwrap();
        let err = store
            .put("k", "v2", PutOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn list_by_prefix_filters_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileParamStore::open(dir.path().join("params.json")).unwrap();
        let keys = ParamKeys::new("test");

        store
            .put(&keys.sc_addr("a"), "0x01", PutOptions::overwrite())
            .await
            .unwrap();
        store
            .put(&keys.sc_inputs("a"), "[]", PutOptions::overwrite())
            .await
            .unwrap();

        let addrs = store.list_by_prefix(&keys.sc_addr_prefix()).await.unwrap();
        assert_eq!(addrs, vec![keys.sc_addr("a")]);
    }

    #[test]
    fn param_keys_follow_the_naming_scheme() {
        let keys = ParamKeys::new("mainnet");
        assert_eq!(keys.sc_addr("voting"), "sv-mainnet-param-sc-addr-voting");
        assert_eq!(keys.sc_inputs("voting"), "sv-mainnet-param-sc-inputs-voting");
        assert_eq!(keys.physical_id(), "sv-mainnet-chaincode-2-cr");
    }
}
