//! 搜索客户端抽象
//!
//! 所有后端（Algolia HN / Mock）实现 SearchClient：给定查询串，返回解析好的故事列表或统一的 SearchError。

use async_trait::async_trait;

use crate::core::{SearchError, Story};

/// 远程搜索客户端 trait
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// 按查询串搜索，返回按服务端顺序排列的故事
    async fn search(&self, query: &str) -> Result<Vec<Story>, SearchError>;

    /// 后端名，用于日志
    fn name(&self) -> &str {
        "search"
    }
}
