//! 可观测性
//!
//! TUI 占用终端，因此 fmt 层写入日志文件（不带 ANSI 颜色）；未配置日志文件时只安装过滤器，不输出。
//! RUST_LOG 优先于配置中的级别。

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

pub fn init(log_file: Option<&Path>, default_level: &str) -> anyhow::Result<()> {
    let filter = env_filter(default_level);
    match log_file.filter(|p| !p.as_os_str().is_empty()) {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Create log dir {}", parent.display()))?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()
                .context("Install tracing subscriber")?;
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .try_init()
                .context("Install tracing subscriber")?;
        }
    }
    Ok(())
}

