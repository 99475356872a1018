//! Mock 搜索客户端（用于测试与离线模式，无需网络）
//!
//! 按查询串预置结果与延迟；未预置的查询返回一条以查询命名的故事。记录所有调用，便于断言「打字不触发请求」。

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::{SearchError, Story};
use crate::search::SearchClient;

#[derive(Debug, Clone)]
struct Scripted {
    delay: Duration,
    outcome: Result<Vec<Story>, SearchError>,
}

/// Mock 客户端：预置响应 + 调用记录
#[derive(Debug, Default)]
pub struct MockSearchClient {
    scripted: HashMap<String, Scripted>,
    calls: Mutex<Vec<String>>,
}

impl MockSearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置某查询的成功结果与延迟
    pub fn with_stories(mut self, query: &str, delay: Duration, stories: Vec<Story>) -> Self {
        self.scripted.insert(
            query.to_string(),
            Scripted {
                delay,
                outcome: Ok(stories),
            },
        );
        self
    }

    /// 预置某查询的失败结果与延迟
    pub fn with_failure(mut self, query: &str, delay: Duration, error: SearchError) -> Self {
        self.scripted.insert(
            query.to_string(),
            Scripted {
                delay,
                outcome: Err(error),
            },
        );
        self
    }

    /// 已收到的查询（按调用顺序）
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

/// 构造一条测试故事，id 与标题由调用方给出
pub fn sample_story(id: &str, title: &str) -> Story {
    Story {
        id: id.to_string(),
        title: title.to_string(),
        url: format!("https://news.ycombinator.com/item?id={}", id),
        author: "mock".to_string(),
        comment_count: 0,
        points: 1,
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<Story>, SearchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(query.to_string());
        }
        match self.scripted.get(query) {
            Some(scripted) => {
                if !scripted.delay.is_zero() {
                    tokio::time::sleep(scripted.delay).await;
                }
                scripted.outcome.clone()
            }
            None => Ok(vec![sample_story(&format!("mock-{}", query), query)]),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
