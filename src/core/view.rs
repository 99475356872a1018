//! 视图投影：RequestState -> RenderIntent
//!
//! 纯函数，无副作用。搜索在服务端完成（提交时重新请求），这里不做任何本地过滤。

use crate::core::{RequestState, Story};

/// UI 应渲染的内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderIntent<'a> {
    ShowLoading,
    ShowError,
    ShowList(&'a [Story]),
}

/// 加载优先于错误，其次才是列表
pub fn project(state: &RequestState) -> RenderIntent<'_> {
    if state.is_loading {
        RenderIntent::ShowLoading
    } else if state.is_error {
        RenderIntent::ShowError
    } else {
        RenderIntent::ShowList(&state.items)
    }
}

/// 查询为空时不允许提交；纯空白仍可提交，由服务端决定结果
pub fn submit_enabled(query: &str) -> bool {
    !query.is_empty()
}
