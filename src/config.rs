//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `HNS__*` 覆盖（双下划线表示嵌套，如 `HNS__SEARCH__INITIAL_QUERY=Rust`）。

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub ui: UiSection,
}

/// [app] 段：应用名、日志文件与级别
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    /// TUI 占用终端，日志写文件；为空则不输出日志
    #[serde(default = "default_log_file")]
    pub log_file: Option<PathBuf>,
    /// RUST_LOG 未设置时使用的级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AppSection {
    /// 实际使用的日志文件；未配置或配置为空串时返回 None（不输出日志）
    pub fn log_path(&self) -> Option<&Path> {
        self.log_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("data/hn-search.log"))
}

fn default_log_level() -> String {
    "info".to_string()
}

/// [search] 段：后端、endpoint、初始查询、超时
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSection {
    /// 后端：algolia / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_query_param")]
    pub query_param: String,
    /// 存储中没有查询时使用的初始查询；为空表示「尚无查询」
    #[serde(default = "default_initial_query")]
    pub initial_query: String,
    /// 单次请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 新请求开始时是否取消仍在进行的旧请求（过期结果无论如何都会被丢弃）
    #[serde(default = "default_cancel_superseded")]
    pub cancel_superseded: bool,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: default_endpoint(),
            query_param: default_query_param(),
            initial_query: default_initial_query(),
            timeout_secs: default_timeout_secs(),
            cancel_superseded: default_cancel_superseded(),
        }
    }
}

fn default_provider() -> String {
    "algolia".to_string()
}

fn default_endpoint() -> String {
    "https://hn.algolia.com/api/v1/search".to_string()
}

fn default_query_param() -> String {
    "query".to_string()
}

fn default_initial_query() -> String {
    "React".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_cancel_superseded() -> bool {
    true
}

/// [storage] 段：查询持久化文件与 key
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    #[serde(default = "default_query_key")]
    pub query_key: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            query_key: default_query_key(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/state.json")
}

fn default_query_key() -> String {
    "search".to_string()
}

/// [ui] 段：键盘轮询间隔
#[derive(Debug, Clone, Deserialize)]
pub struct UiSection {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    100
}

/// 从 config 目录加载配置，环境变量 HNS__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 HNS__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!("Config file {} not found, ignoring", path.display());
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("HNS")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
