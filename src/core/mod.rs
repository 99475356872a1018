//! 核心层：错误、请求状态机、视图投影、请求编排

pub mod error;
pub mod orchestrator;
pub mod state;
pub mod view;

pub use error::{SearchError, StoreError};
pub use orchestrator::{
    spawn_orchestrator, Command, FetchCycle, OrchestratorSettings, StoriesOrchestrator,
};
pub use state::{
    stories_reducer, CycleId, FetchTarget, RequestState, StoriesAction, Story, UiState,
};
pub use view::{project, submit_enabled, RenderIntent};
