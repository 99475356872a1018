//! 状态定义：Story、RequestState 与纯函数 reducer，以及发给 UI 的 UiState 投影
//!
//! RequestState 只能经由 stories_reducer 变化；编排器独占持有，UI 只拿到克隆快照。

use std::fmt;

use serde::Serialize;

use crate::core::SearchError;

/// 一条搜索结果（HN 故事），以 id 为身份
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub url: String,
    pub author: String,
    pub comment_count: u64,
    pub points: u64,
}

/// 请求生命周期状态：列表 + 加载中 + 出错
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RequestState {
    pub items: Vec<Story>,
    pub is_loading: bool,
    pub is_error: bool,
}

impl RequestState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 驱动 RequestState 的事件（封闭枚举，不存在「未知事件」）
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoriesAction {
    /// 一次请求开始
    FetchInit,
    /// 请求成功，整体替换列表
    FetchSuccess(Vec<Story>),
    /// 请求失败，保留旧列表
    FetchFailure,
    /// 本地移除某条故事（按 id）
    RemoveStory(String),
}

impl StoriesAction {
    /// 事件名，用于日志
    pub fn kind(&self) -> &'static str {
        match self {
            StoriesAction::FetchInit => "STORIES_FETCH_INIT",
            StoriesAction::FetchSuccess(_) => "STORIES_FETCH_SUCCESS",
            StoriesAction::FetchFailure => "STORIES_FETCH_FAILURE",
            StoriesAction::RemoveStory(_) => "REMOVE_STORY",
        }
    }
}

/// 纯状态迁移：无 I/O、确定性。
///
/// 迁移后 is_loading 与 is_error 不能同时为 true，否则直接 panic（属于程序缺陷，不可恢复）。
pub fn stories_reducer(state: RequestState, action: StoriesAction) -> RequestState {
    let next = match action {
        StoriesAction::FetchInit => RequestState {
            is_loading: true,
            is_error: false,
            ..state
        },
        StoriesAction::FetchSuccess(items) => RequestState {
            items,
            is_loading: false,
            is_error: false,
        },
        StoriesAction::FetchFailure => RequestState {
            is_loading: false,
            is_error: true,
            ..state
        },
        StoriesAction::RemoveStory(id) => {
            let mut state = state;
            state.items.retain(|story| story.id != id);
            state
        }
    };
    assert!(
        !(next.is_loading && next.is_error),
        "invariant violated: request state is both loading and failed"
    );
    next
}

/// 一次请求周期的编号，单调递增；只有最新编号的结果允许改写状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CycleId(pub(crate) u64);

impl CycleId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 请求目标：endpoint + 查询参数名 + 查询串。仅在显式提交时重新计算
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FetchTarget {
    pub endpoint: String,
    pub query_param: String,
    pub query: String,
}

impl FetchTarget {
    pub fn new(endpoint: &str, query_param: &str, query: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            query_param: query_param.to_string(),
            query: query.to_string(),
        }
    }

    /// 拼出最终 URL，查询串按 application/x-www-form-urlencoded 编码
    pub fn url(&self) -> Result<reqwest::Url, SearchError> {
        let mut url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| SearchError::Protocol(format!("Invalid endpoint {}: {}", self.endpoint, e)))?;
        url.query_pairs_mut().append_pair(&self.query_param, &self.query);
        Ok(url)
    }
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.url() {
            Ok(url) => write!(f, "{}", url),
            Err(_) => write!(f, "{}?{}={}", self.endpoint, self.query_param, self.query),
        }
    }
}

/// UI 看到的「投影」状态：当前查询、最近提交的目标、请求状态
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UiState {
    pub query: String,
    pub target: Option<FetchTarget>,
    pub stories: RequestState,
    pub latest_cycle: Option<CycleId>,
}
