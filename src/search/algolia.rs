//! Algolia HN 搜索客户端
//!
//! GET `<endpoint>?query=<编码后的查询>`，带超时与 User-Agent；响应体为 `{ "hits": [...] }`。
//! 网络错误归为 Transport，非 2xx 与 JSON 结构不符归为 Protocol。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::core::{FetchTarget, SearchError, Story};
use crate::search::SearchClient;

const USER_AGENT: &str = concat!("hn-search/", env!("CARGO_PKG_VERSION"));

/// 响应体顶层
#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<HitRecord>,
}

/// 单条命中记录；HN 的 title/url 等字段可能为 null
#[derive(Debug, Deserialize)]
struct HitRecord {
    #[serde(rename = "objectID")]
    object_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    num_comments: Option<u64>,
    #[serde(default)]
    points: Option<u64>,
}

impl From<HitRecord> for Story {
    fn from(hit: HitRecord) -> Self {
        Story {
            id: hit.object_id,
            title: hit.title.unwrap_or_default(),
            url: hit.url.unwrap_or_default(),
            author: hit.author.unwrap_or_default(),
            comment_count: hit.num_comments.unwrap_or(0),
            points: hit.points.unwrap_or(0),
        }
    }
}

/// 解析响应体为故事列表，保持服务端顺序
pub fn parse_hits(body: &[u8]) -> Result<Vec<Story>, SearchError> {
    let resp: SearchResponse = serde_json::from_slice(body)
        .map_err(|e| SearchError::Protocol(format!("Malformed response body: {}", e)))?;
    Ok(resp.hits.into_iter().map(Story::from).collect())
}

/// HN 搜索客户端：持有 reqwest Client 与 endpoint
///
/// 请求 URL 由客户端自己的 endpoint 拼出；编排器的 FetchTarget 取自同一个 [search] 配置段，
/// 只用于日志和「目标是否变化」的比较。
pub struct AlgoliaClient {
    client: Client,
    endpoint: String,
    query_param: String,
}

impl AlgoliaClient {
    pub fn new(endpoint: &str, query_param: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self::with_client(client, endpoint, query_param)
    }

    /// 使用外部构造好的 reqwest Client（自定义代理、TLS 等）
    pub fn with_client(client: Client, endpoint: &str, query_param: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            query_param: query_param.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SearchClient for AlgoliaClient {
    async fn search(&self, query: &str) -> Result<Vec<Story>, SearchError> {
        let url = FetchTarget::new(&self.endpoint, &self.query_param, query).url()?;
        tracing::debug!(url = %url, "hn search request");

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::Protocol(format!("HTTP {}", status)));
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| SearchError::Transport(format!("Read body: {}", e)))?;
        parse_hits(&body)
    }

    fn name(&self) -> &str {
        "algolia"
    }
}
