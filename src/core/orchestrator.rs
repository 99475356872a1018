//! 请求编排器：决定何时发请求，并把结果翻译成 reducer 事件
//!
//! - 启动时按持久化（或默认）查询发起一次请求，查询为空也照常请求
//! - 输入只更新并持久化查询串，不发请求；只有显式提交且目标变化时才发起新一轮
//! - 每轮请求带 CycleId，只有最新一轮的结果能改写状态（过期结果直接丢弃）
//! - 移除条目只在本地生效，不访问网络
//!
//! `spawn_orchestrator` 在后台任务中独占 StoriesOrchestrator，串行处理 UI 命令与请求完成事件，
//! 每次状态迁移后通过 watch 通道推送 UiState。

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::core::view::submit_enabled;
use crate::core::{
    stories_reducer, CycleId, FetchTarget, RequestState, SearchError, StoriesAction, Story,
    UiState,
};
use crate::search::SearchClient;
use crate::storage::ScalarStore;

/// 从 UI 发往编排器的用户命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 输入框内容变化（只持久化，不请求）
    Input(String),
    /// 显式提交当前查询
    Submit,
    /// 重新请求当前目标（手动重试）
    Refresh,
    /// 移除某条故事（按 id）
    Remove(String),
    /// 退出
    Quit,
}

/// 编排器所需的配置子集
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub endpoint: String,
    pub query_param: String,
    pub initial_query: String,
    pub query_key: String,
    pub cancel_superseded: bool,
}

impl OrchestratorSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            endpoint: cfg.search.endpoint.clone(),
            query_param: cfg.search.query_param.clone(),
            initial_query: cfg.search.initial_query.clone(),
            query_key: cfg.storage.query_key.clone(),
            cancel_superseded: cfg.search.cancel_superseded,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// 已开始、尚未完成的一轮请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCycle {
    pub id: CycleId,
    pub target: FetchTarget,
}

/// 单写者编排器：独占 RequestState，所有迁移都经过 dispatch
pub struct StoriesOrchestrator {
    settings: OrchestratorSettings,
    client: Arc<dyn SearchClient>,
    store: Arc<dyn ScalarStore>,
    query: String,
    target: Option<FetchTarget>,
    stories: RequestState,
    next_cycle: u64,
    latest_cycle: Option<CycleId>,
    activated: bool,
    state_tx: watch::Sender<UiState>,
}

impl StoriesOrchestrator {
    /// 创建编排器；查询串从存储读取一次，缺失或为空时使用 initial_query
    pub fn new(
        settings: OrchestratorSettings,
        client: Arc<dyn SearchClient>,
        store: Arc<dyn ScalarStore>,
    ) -> Self {
        let query = store
            .get(&settings.query_key)
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| settings.initial_query.clone());
        let (state_tx, _) = watch::channel(UiState {
            query: query.clone(),
            ..UiState::default()
        });
        Self {
            settings,
            client,
            store,
            query,
            target: None,
            stories: RequestState::new(),
            next_cycle: 0,
            latest_cycle: None,
            activated: false,
            state_tx,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn target(&self) -> Option<&FetchTarget> {
        self.target.as_ref()
    }

    pub fn stories(&self) -> &RequestState {
        &self.stories
    }

    pub fn latest_cycle(&self) -> Option<CycleId> {
        self.latest_cycle
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn client(&self) -> Arc<dyn SearchClient> {
        Arc::clone(&self.client)
    }

    /// 订阅状态快照；每次迁移后都会推送最新值
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.state_tx.subscribe()
    }

    /// 当前状态的投影
    pub fn snapshot(&self) -> UiState {
        UiState {
            query: self.query.clone(),
            target: self.target.clone(),
            stories: self.stories.clone(),
            latest_cycle: self.latest_cycle,
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.snapshot());
    }

    fn dispatch(&mut self, action: StoriesAction) {
        let kind = action.kind();
        let state = std::mem::take(&mut self.stories);
        self.stories = stories_reducer(state, action);
        tracing::trace!(
            action = kind,
            items = self.stories.items.len(),
            loading = self.stories.is_loading,
            error = self.stories.is_error,
            "stories dispatched"
        );
        self.publish();
    }

    fn begin(&mut self, target: FetchTarget) -> FetchCycle {
        self.next_cycle += 1;
        let id = CycleId(self.next_cycle);
        self.latest_cycle = Some(id);
        self.target = Some(target.clone());
        tracing::info!(
            cycle = %id,
            target = %target,
            client = self.client.name(),
            "fetch cycle started"
        );
        self.dispatch(StoriesAction::FetchInit);
        FetchCycle { id, target }
    }

    fn build_target(&self) -> FetchTarget {
        FetchTarget::new(&self.settings.endpoint, &self.settings.query_param, &self.query)
    }

    /// 首次激活：无条件发起第一轮请求（空查询同样请求）。重复调用无效
    pub fn activate(&mut self) -> Option<FetchCycle> {
        if self.activated {
            return None;
        }
        self.activated = true;
        let target = self.build_target();
        Some(self.begin(target))
    }

    /// 输入变化：更新并持久化查询串，不触发请求
    pub fn set_query(&mut self, query: &str) {
        if self.query == query {
            return;
        }
        self.query = query.to_string();
        if let Err(e) = self.store.set(&self.settings.query_key, &self.query) {
            tracing::warn!("Persist query failed: {}", e);
        }
        self.publish();
    }

    /// 显式提交：查询非空且目标有变化时开始新一轮
    pub fn submit(&mut self) -> Option<FetchCycle> {
        self.activated = true;
        if !submit_enabled(&self.query) {
            tracing::debug!("Submit ignored: empty query");
            return None;
        }
        let target = self.build_target();
        if self.target.as_ref() == Some(&target) {
            tracing::debug!(target = %target, "Submit ignored: target unchanged");
            return None;
        }
        Some(self.begin(target))
    }

    /// 对当前目标重新请求；尚无目标时等同于 submit
    pub fn refresh(&mut self) -> Option<FetchCycle> {
        match self.target.clone() {
            Some(target) => Some(self.begin(target)),
            None => self.submit(),
        }
    }

    /// 一轮请求结束。只有最新一轮会被应用；返回是否应用
    pub fn complete(&mut self, cycle: CycleId, outcome: Result<Vec<Story>, SearchError>) -> bool {
        if self.latest_cycle != Some(cycle) {
            tracing::debug!(
                cycle = %cycle,
                latest = ?self.latest_cycle.map(|c| c.value()),
                "Stale fetch outcome ignored"
            );
            return false;
        }
        match outcome {
            Ok(items) => {
                tracing::info!(cycle = %cycle, hits = items.len(), "fetch cycle succeeded");
                self.dispatch(StoriesAction::FetchSuccess(items));
            }
            Err(e) => {
                tracing::warn!(cycle = %cycle, "fetch cycle failed: {}", e);
                self.dispatch(StoriesAction::FetchFailure);
            }
        }
        true
    }

    /// 本地移除，不访问网络
    pub fn remove(&mut self, story_id: &str) {
        self.dispatch(StoriesAction::RemoveStory(story_id.to_string()));
    }

    /// 在当前任务中执行一轮请求并应用结果（不经过后台任务）
    pub async fn run_cycle(&mut self, cycle: FetchCycle) -> bool {
        let outcome = self.client.search(&cycle.target.query).await;
        self.complete(cycle.id, outcome)
    }
}

/// 后台请求完成事件
#[derive(Debug)]
struct CycleOutcome {
    cycle: CycleId,
    result: Result<Vec<Story>, SearchError>,
}

/// 在独立任务中执行请求；token 被取消时直接放弃，不回报结果。
/// 客户端 panic 时回报失败，保证每一轮都以成功或失败结束
fn launch(
    client: Arc<dyn SearchClient>,
    cycle: FetchCycle,
    done_tx: mpsc::UnboundedSender<CycleOutcome>,
) -> CancellationToken {
    let token = CancellationToken::new();
    let cancelled = token.clone();
    tokio::spawn(async move {
        let query = cycle.target.query.clone();
        let search = tokio::spawn(async move { client.search(&query).await });
        let abort = search.abort_handle();
        tokio::select! {
            _ = cancelled.cancelled() => {
                abort.abort();
                tracing::debug!(cycle = %cycle.id, "superseded request cancelled");
            }
            joined = search => {
                let result = joined.unwrap_or_else(|e| {
                    tracing::error!(cycle = %cycle.id, "search task failed: {}", e);
                    Err(SearchError::Transport(format!("Search task failed: {}", e)))
                });
                let _ = done_tx.send(CycleOutcome { cycle: cycle.id, result });
            }
        }
    });
    token
}

/// 启动编排器：返回命令发送端、状态接收端与后台任务句柄。
///
/// 后台任务是唯一的写者：UI 命令与请求完成事件都在同一个 select 循环里串行应用。
pub fn spawn_orchestrator(
    mut orchestrator: StoriesOrchestrator,
) -> (
    mpsc::UnboundedSender<Command>,
    watch::Receiver<UiState>,
    JoinHandle<()>,
) {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
    let state_rx = orchestrator.subscribe();

    let handle = tokio::spawn(async move {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<CycleOutcome>();
        let cancel_superseded = orchestrator.settings().cancel_superseded;
        let mut inflight: Option<CancellationToken> = None;

        if let Some(cycle) = orchestrator.activate() {
            inflight = Some(launch(orchestrator.client(), cycle, done_tx.clone()));
        }

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    let cycle = match cmd {
                        Command::Input(query) => {
                            orchestrator.set_query(&query);
                            None
                        }
                        Command::Submit => orchestrator.submit(),
                        Command::Refresh => orchestrator.refresh(),
                        Command::Remove(id) => {
                            orchestrator.remove(&id);
                            None
                        }
                        Command::Quit => break,
                    };
                    if let Some(cycle) = cycle {
                        if cancel_superseded {
                            if let Some(token) = inflight.take() {
                                token.cancel();
                            }
                        }
                        inflight = Some(launch(orchestrator.client(), cycle, done_tx.clone()));
                    }
                }
                Some(outcome) = done_rx.recv() => {
                    orchestrator.complete(outcome.cycle, outcome.result);
                }
            }
        }

        if let Some(token) = inflight.take() {
            token.cancel();
        }
        tracing::info!("Orchestrator stopped");
    });

    (cmd_tx, state_rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{sample_story, MockSearchClient};
    use crate::storage::MemoryStore;

    fn orchestrator_with(
        client: Arc<MockSearchClient>,
        store: Arc<MemoryStore>,
    ) -> StoriesOrchestrator {
        StoriesOrchestrator::new(OrchestratorSettings::default(), client, store)
    }

    fn default_orchestrator() -> (StoriesOrchestrator, Arc<MockSearchClient>, Arc<MemoryStore>) {
        let client = Arc::new(MockSearchClient::new());
        let store = Arc::new(MemoryStore::new());
        (orchestrator_with(client.clone(), store.clone()), client, store)
    }

    #[test]
    fn test_query_falls_back_to_initial() {
        let (orch, _, _) = default_orchestrator();
        assert_eq!(orch.query(), "React");
        assert_eq!(orch.stories(), &RequestState::new());
        assert!(orch.target().is_none());
    }

    #[test]
    fn test_query_restored_from_store() {
        let client = Arc::new(MockSearchClient::new());
        let store = Arc::new(MemoryStore::with_value("search", "Redux"));
        let orch = orchestrator_with(client, store);
        assert_eq!(orch.query(), "Redux");
    }

    #[test]
    fn test_empty_stored_query_uses_initial() {
        let client = Arc::new(MockSearchClient::new());
        let store = Arc::new(MemoryStore::with_value("search", ""));
        let orch = orchestrator_with(client, store);
        assert_eq!(orch.query(), "React");
    }

    #[test]
    fn test_activate_starts_first_cycle_once() {
        let (mut orch, _, _) = default_orchestrator();
        let cycle = orch.activate().unwrap();
        assert_eq!(cycle.target.query, "React");
        assert_eq!(orch.latest_cycle(), Some(cycle.id));
        assert!(orch.stories().is_loading);
        assert!(orch.activate().is_none());
    }

    #[test]
    fn test_activate_with_empty_query_still_fetches() {
        let settings = OrchestratorSettings {
            initial_query: String::new(),
            ..OrchestratorSettings::default()
        };
        let mut orch = StoriesOrchestrator::new(
            settings,
            Arc::new(MockSearchClient::new()),
            Arc::new(MemoryStore::new()),
        );
        let cycle = orch.activate().unwrap();
        assert_eq!(cycle.target.query, "");
        assert_eq!(
            cycle.target.url().unwrap().as_str(),
            "https://hn.algolia.com/api/v1/search?query="
        );
        assert!(orch.stories().is_loading);
        assert_eq!(orch.latest_cycle(), Some(cycle.id));
    }

    #[test]
    fn test_typing_persists_without_fetching() {
        let (mut orch, client, store) = default_orchestrator();
        let before = orch.stories().clone();

        orch.set_query("R");
        orch.set_query("Ru");
        orch.set_query("Rust");

        assert_eq!(orch.query(), "Rust");
        assert_eq!(store.get("search"), Some("Rust".to_string()));
        assert_eq!(orch.stories(), &before);
        assert!(orch.latest_cycle().is_none());
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_submit_only_when_target_changes() {
        let (mut orch, _, _) = default_orchestrator();
        let first = orch.activate().unwrap();

        // 目标没变，不重新请求
        assert!(orch.submit().is_none());

        orch.set_query("Rust");
        let second = orch.submit().unwrap();
        assert!(second.id > first.id);
        assert_eq!(second.target.query, "Rust");
        assert_eq!(orch.target(), Some(&second.target));
    }

    #[test]
    fn test_submit_empty_query_is_ignored() {
        let (mut orch, _, _) = default_orchestrator();
        orch.set_query("");
        assert!(orch.submit().is_none());
        assert!(orch.latest_cycle().is_none());

        // 纯空白不是空查询，照常提交
        orch.set_query("  ");
        let cycle = orch.submit().unwrap();
        assert_eq!(cycle.target.query, "  ");
    }

    #[test]
    fn test_refresh_reissues_current_target() {
        let (mut orch, _, _) = default_orchestrator();
        let first = orch.activate().unwrap();
        orch.complete(first.id, Ok(vec![sample_story("1", "React")]));

        let again = orch.refresh().unwrap();
        assert_eq!(again.target, first.target);
        assert!(again.id > first.id);
        assert!(orch.stories().is_loading);
    }

    #[test]
    fn test_complete_success_and_failure() {
        let (mut orch, _, _) = default_orchestrator();
        let cycle = orch.activate().unwrap();
        assert!(orch.complete(cycle.id, Ok(vec![sample_story("1", "React")])));
        assert_eq!(orch.stories().items.len(), 1);
        assert!(!orch.stories().is_loading);

        let retry = orch.refresh().unwrap();
        assert!(orch.complete(retry.id, Err(SearchError::Transport("offline".into()))));
        // 失败不清空旧数据
        assert!(orch.stories().is_error);
        assert_eq!(orch.stories().items.len(), 1);
    }

    #[test]
    fn test_out_of_order_completion_keeps_newest() {
        let (mut orch, _, _) = default_orchestrator();
        orch.activated = true;

        orch.set_query("React");
        let react = orch.submit().unwrap();
        orch.set_query("Google");
        let google = orch.submit().unwrap();

        assert!(orch.complete(google.id, Ok(vec![sample_story("g", "Google")])));
        assert!(!orch.complete(react.id, Ok(vec![sample_story("r", "React")])));

        let ids: Vec<&str> = orch.stories().items.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["g"]);
        assert!(!orch.stories().is_loading);
    }

    #[test]
    fn test_stale_failure_does_not_flag_error() {
        let (mut orch, _, _) = default_orchestrator();
        let old = orch.activate().unwrap();
        orch.set_query("Google");
        let new = orch.submit().unwrap();

        assert!(!orch.complete(old.id, Err(SearchError::Protocol("HTTP 500".into()))));
        assert!(orch.stories().is_loading);
        assert!(!orch.stories().is_error);

        assert!(orch.complete(new.id, Ok(vec![])));
        assert!(!orch.stories().is_error);
    }

    #[test]
    fn test_remove_is_local() {
        let (mut orch, client, _) = default_orchestrator();
        let cycle = orch.activate().unwrap();
        orch.complete(
            cycle.id,
            Ok(vec![sample_story("1", "React"), sample_story("2", "Redux")]),
        );

        orch.remove("1");
        let ids: Vec<&str> = orch.stories().items.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_observers_see_latest_state() {
        let (mut orch, _, _) = default_orchestrator();
        let rx = orch.subscribe();

        let cycle = orch.activate().unwrap();
        assert!(rx.borrow().stories.is_loading);
        assert_eq!(rx.borrow().latest_cycle, Some(cycle.id));

        orch.complete(cycle.id, Ok(vec![sample_story("1", "React")]));
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot, orch.snapshot());
        assert_eq!(snapshot.stories.items.len(), 1);

        orch.set_query("Rust");
        assert_eq!(rx.borrow().query, "Rust");
    }

    #[tokio::test]
    async fn test_run_cycle_with_mock_client() {
        let client = Arc::new(
            MockSearchClient::new()
                .with_stories(
                    "React",
                    std::time::Duration::ZERO,
                    vec![sample_story("0", "React"), sample_story("1", "Redux")],
                ),
        );
        let mut orch = orchestrator_with(client.clone(), Arc::new(MemoryStore::new()));
        let cycle = orch.activate().unwrap();
        assert!(orch.run_cycle(cycle).await);
        assert_eq!(orch.stories().items.len(), 2);
        assert_eq!(client.calls(), vec!["React"]);
    }

    struct PanickingClient;

    #[async_trait::async_trait]
    impl SearchClient for PanickingClient {
        async fn search(&self, query: &str) -> Result<Vec<Story>, SearchError> {
            panic!("client bug while searching {}", query);
        }
    }

    #[tokio::test]
    async fn test_panicking_client_ends_cycle_in_failure() {
        let orch = StoriesOrchestrator::new(
            OrchestratorSettings::default(),
            Arc::new(PanickingClient),
            Arc::new(MemoryStore::new()),
        );
        let (cmd_tx, mut state_rx, handle) = spawn_orchestrator(orch);

        let state = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            state_rx.wait_for(|s| s.stories.is_error),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();
        assert!(!state.stories.is_loading);
        assert_eq!(state.latest_cycle.map(|c| c.value()), Some(1));

        cmd_tx.send(Command::Quit).unwrap();
        handle.await.unwrap();
    }
}
