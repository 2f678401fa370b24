//! 本地键值存储 - 基础设施层
//!
//! 持久化"图片顺序"提示和视图模式，重启后恢复。只存字符串值，无事务保证

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::{AppError, AppResult, StoreError};

/// 顺序在存储中使用的固定键
pub const ORDER_STORE_KEY: &str = "imageOrder";

/// 上次使用的视图模式
pub const VIEW_MODE_KEY: &str = "viewMode";

/// 字符串键值存储
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// 内存存储，进程结束即丢失
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// JSON 文件存储
///
/// 文件内容是一个 `{键: 字符串值}` 对象，每次写入都整体重写
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> AppResult<HashMap<String, String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => {
                return Err(StoreError::ReadFailed {
                    path: self.path.display().to_string(),
                    source,
                }
                .into())
            }
        };

        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }

        serde_json::from_str(&content).map_err(|source| {
            StoreError::Corrupt {
                key: self.path.display().to_string(),
                source,
            }
            .into()
        })
    }

    /// 写入前读取：只有内容损坏时才当作空，读取失败原样返回
    fn read_for_update(&self) -> AppResult<HashMap<String, String>> {
        match self.read_all() {
            Err(AppError::Store(StoreError::Corrupt { .. })) => {
                warn!("存储文件已损坏，将被覆盖: {}", self.path.display());
                Ok(HashMap::new())
            }
            other => other,
        }
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> AppResult<()> {
        let path = self.path.display().to_string();
        let content = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Corrupt {
            key: path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::WriteFailed {
                path: path.clone(),
                source,
            })?;
        }

        fs::write(&self.path, content).map_err(|source| StoreError::WriteFailed { path, source })?;
        debug!("已写入存储文件: {}", self.path.display());
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_for_update()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_for_update()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// 读取已保存的顺序，未保存时返回空列表
pub fn load_order(store: &dyn KeyValueStore) -> AppResult<Vec<String>> {
    match store.get(ORDER_STORE_KEY)? {
        Some(raw) => serde_json::from_str(&raw).map_err(|source| {
            StoreError::Corrupt {
                key: ORDER_STORE_KEY.to_string(),
                source,
            }
            .into()
        }),
        None => Ok(Vec::new()),
    }
}

/// 保存顺序（名称列表的 JSON）
pub fn save_order(store: &dyn KeyValueStore, names: &[String]) -> AppResult<()> {
    let raw = serde_json::to_string(names).map_err(|source| StoreError::Corrupt {
        key: ORDER_STORE_KEY.to_string(),
        source,
    })?;
    store.set(ORDER_STORE_KEY, &raw)
}

/// 清除已保存的顺序
pub fn clear_order(store: &dyn KeyValueStore) -> AppResult<()> {
    store.remove(ORDER_STORE_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip_order() {
        let store = MemoryStore::new();
        assert!(load_order(&store).unwrap().is_empty());

        let names = vec!["b.jpg".to_string(), "a.jpg".to_string()];
        save_order(&store, &names).unwrap();
        assert_eq!(load_order(&store).unwrap(), names);

        clear_order(&store).unwrap();
        assert!(load_order(&store).unwrap().is_empty());
    }

    #[test]
    fn test_file_store_survives_new_instance() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        {
            let store = JsonFileStore::new(&path);
            save_order(&store, &["c.jpg".to_string(), "a.jpg".to_string()]).unwrap();
            store.set(VIEW_MODE_KEY, "indexation").unwrap();
        }

        let reopened = JsonFileStore::new(&path);
        assert_eq!(load_order(&reopened).unwrap(), vec!["c.jpg", "a.jpg"]);
        assert_eq!(
            reopened.get(VIEW_MODE_KEY).unwrap().as_deref(),
            Some("indexation")
        );
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("missing.json"));
        assert_eq!(store.get(ORDER_STORE_KEY).unwrap(), None);
    }

    #[test]
    fn test_corrupt_order_is_reported() {
        let store = MemoryStore::new();
        store.set(ORDER_STORE_KEY, "not json").unwrap();
        let err = load_order(&store).unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_corrupt_file_is_overwritten_on_set() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{{{").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(store.get(ORDER_STORE_KEY).is_err());

        save_order(&store, &["a.jpg".to_string()]).unwrap();
        assert_eq!(load_order(&store).unwrap(), vec!["a.jpg"]);
    }

    #[test]
    fn test_read_failure_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        // 路径是目录，读取会失败但内容并未损坏
        let path = dir.path().join("state.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), "keep").unwrap();
        let store = JsonFileStore::new(&path);

        let err = save_order(&store, &["a.jpg".to_string()]).unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::ReadFailed { .. })));
        let err = clear_order(&store).unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::ReadFailed { .. })));

        assert!(path.is_dir());
        assert_eq!(fs::read_to_string(path.join("keep.txt")).unwrap(), "keep");
    }
}
