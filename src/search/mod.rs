//! 搜索层：客户端抽象与实现（Algolia HN / Mock）

pub mod algolia;
pub mod mock;
pub mod traits;

use std::sync::Arc;

pub use algolia::{parse_hits, AlgoliaClient};
pub use mock::{sample_story, MockSearchClient};
pub use traits::SearchClient;

use crate::config::AppConfig;

/// 根据配置选择搜索后端（algolia / mock）
pub fn create_client_from_config(cfg: &AppConfig) -> Arc<dyn SearchClient> {
    match cfg.search.provider.to_lowercase().as_str() {
        "mock" => {
            tracing::warn!("Using mock search client, no network requests will be made");
            Arc::new(MockSearchClient::new())
        }
        provider => {
            if provider != "algolia" {
                tracing::warn!("Unknown search provider '{}', falling back to algolia", provider);
            }
            let client = AlgoliaClient::new(
                &cfg.search.endpoint,
                &cfg.search.query_param,
                cfg.search.timeout_secs,
            );
            tracing::info!("Using Algolia HN search ({})", client.endpoint());
            Arc::new(client)
        }
    }
}
