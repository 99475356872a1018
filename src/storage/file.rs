//! JSON 文件存储
//!
//! 整个文件是一个 key -> { value, updated_at } 的映射；每次 set 都整体重写，父目录不存在时自动创建。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::core::StoreError;
use crate::storage::ScalarStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredValue {
    value: String,
    updated_at: String,
}

/// 单文件 JSON 存储；启动时读一次，写入时同步落盘
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, StoredValue>>,
}

impl JsonFileStore {
    /// 打开存储；文件不存在时视为空。文件损坏返回错误，由调用方决定是否回退
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            if data.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 锁中毒时仍取回内部数据：map 只在单次 insert 中修改，不会处于半写状态
    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, StoredValue>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, entries: &BTreeMap<String, StoredValue>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl ScalarStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).map(|v| v.value.clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries();
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                updated_at: chrono::Utc::now().to_rfc3339(),
            },
        );
        self.flush(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("state.json")).unwrap();
        assert_eq!(store.get("search"), None);
    }

    #[test]
    fn test_value_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.set("search", "Redux").unwrap();
        assert!(path.exists());

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("search"), Some("Redux".to_string()));
    }

    #[test]
    fn test_file_format_has_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.set("search", "React").unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["search"]["value"], "React");
        assert!(raw["search"]["updated_at"].is_string());
    }

    #[test]
    fn test_corrupted_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_poisoned_lock_still_reads_and_writes() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(JsonFileStore::open(dir.path().join("state.json")).unwrap());
        store.set("search", "Redux").unwrap();

        let poisoner = std::sync::Arc::clone(&store);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("panic while holding the store lock");
        })
        .join();
        assert!(joined.is_err());
        assert!(store.entries.is_poisoned());

        assert_eq!(store.get("search"), Some("Redux".to_string()));
        store.set("search", "Rust").unwrap();
        assert_eq!(store.get("search"), Some("Rust".to_string()));
    }
}
