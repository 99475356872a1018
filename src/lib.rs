//! HN Search - Hacker News 故事搜索终端客户端
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 请求状态机（reducer）、视图投影、请求编排
//! - **observability**: tracing 日志初始化
//! - **search**: 搜索客户端抽象与实现（Algolia HN / Mock）
//! - **storage**: 持久化标量存储（JSON 文件 / 内存）
//! - **ui**: Ratatui TUI 界面

pub mod config;
pub mod core;
pub mod observability;
pub mod search;
pub mod storage;
pub mod ui;

pub use crate::core::{spawn_orchestrator, Command, StoriesOrchestrator, UiState};
