//! 错误类型：搜索请求失败与标量存储失败
//!
//! 编排器把 SearchError 的所有变体折叠为同一个 FetchFailure 事件；StoreError 只记录日志，不中断 UI。

use thiserror::Error;

/// 远程搜索失败（网络层 / 协议层），对编排器而言是同一种失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// 网络不可达、连接被拒、超时等
    #[error("Transport failure: {0}")]
    Transport(String),

    /// 非 2xx 状态码或响应体无法解析
    #[error("Protocol failure: {0}")]
    Protocol(String),
}

impl SearchError {
    pub fn is_transport(&self) -> bool {
        matches!(self, SearchError::Transport(_))
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_status() || e.is_decode() {
            SearchError::Protocol(e.to_string())
        } else {
            SearchError::Transport(e.to_string())
        }
    }
}

/// 持久化标量存储的读写错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
