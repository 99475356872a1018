//! 持久化标量存储
//!
//! 只存一个具名字符串（搜索查询），跨进程保留。定义统一接口，支持内存和 JSON 文件两种实现。

pub mod file;

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::core::StoreError;

pub use file::JsonFileStore;

/// 标量存储接口：按 key 读写单个字符串
pub trait ScalarStore: Send + Sync {
    /// 读取；不存在时返回 None
    fn get(&self, key: &str) -> Option<String>;

    /// 写入并持久化
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// 内存存储（测试用，进程退出即丢失）
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一个值
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl ScalarStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
