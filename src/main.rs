//! HN Search - Hacker News 故事搜索终端客户端
//!
//! 入口：加载配置、初始化日志、创建搜索客户端与查询存储，启动编排器与 TUI 主循环。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use hn_search::config::{load_config, AppConfig};
use hn_search::core::{spawn_orchestrator, Command, OrchestratorSettings, StoriesOrchestrator};
use hn_search::search::create_client_from_config;
use hn_search::storage::{JsonFileStore, MemoryStore, ScalarStore};
use hn_search::{observability, ui::run_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 可选：第一个参数为额外的配置文件路径
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let (cfg, config_error) = match load_config(config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    observability::init(cfg.app.log_path(), &cfg.app.log_level)
        .context("Failed to init logging")?;
    if let Some(e) = config_error {
        tracing::warn!("Config load failed ({}), using defaults", e);
    }

    // 查询存储打不开时退化为内存存储，只是不跨进程保留
    let store: Arc<dyn ScalarStore> = match JsonFileStore::open(&cfg.storage.path) {
        Ok(store) => {
            tracing::info!("Query store: {}", store.path().display());
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(
                "Open query store {} failed ({}), query will not persist",
                cfg.storage.path.display(),
                e
            );
            Arc::new(MemoryStore::new())
        }
    };

    let client = create_client_from_config(&cfg);
    let orchestrator =
        StoriesOrchestrator::new(OrchestratorSettings::from_config(&cfg), client, store);

    let (cmd_tx, state_rx, handle) = spawn_orchestrator(orchestrator);

    run_app(
        state_rx,
        cmd_tx.clone(),
        Duration::from_millis(cfg.ui.poll_interval_ms.max(10)),
    )
    .await
    .context("App run failed")?;

    let _ = cmd_tx.send(Command::Quit);
    let _ = handle.await;
    Ok(())
}
