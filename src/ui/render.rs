//! 界面渲染
//!
//! 上方为搜索框（标题栏显示请求阶段），中间按 RenderIntent 显示加载中 / 出错 / 故事列表，
//! 底部为快捷键提示。

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::core::{project, submit_enabled, RenderIntent, Story, UiState};
use crate::ui::app::InputState;

const LOADING_TEXT: &str = "Loading...";
const ERROR_TEXT: &str = "Something went wrong ...";
const EMPTY_TEXT: &str = "No stories.";

fn phase_label(state: &UiState) -> &'static str {
    match project(&state.stories) {
        RenderIntent::ShowLoading => "加载中…",
        RenderIntent::ShowError => "错误",
        RenderIntent::ShowList(_) => "就绪",
    }
}

/// 单条故事：第一行标题 + 链接，第二行作者 / 评论数 / 分数
fn story_item(story: &Story) -> ListItem<'static> {
    let title = if story.title.is_empty() {
        "(untitled)".to_string()
    } else {
        story.title.clone()
    };
    let first = Line::from(vec![
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(story.url.clone(), Style::default().fg(Color::Blue)),
    ]);
    let second = Line::from(Span::styled(
        format!(
            "  Author: {} │ Comments: {} │ Points: {}",
            story.author, story.comment_count, story.points
        ),
        Style::default().fg(Color::DarkGray),
    ));
    ListItem::new(vec![first, second])
}

fn draw_search_box(f: &mut Frame, area: Rect, state: &UiState, input: &InputState) {
    let title = format!(" HN Search │ {} ", phase_label(state));
    let border_color = if submit_enabled(&input.buffer) {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let line = Line::from(vec![
        Span::styled("Search: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(input.buffer.as_str()),
    ]);
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_body(f: &mut Frame, area: Rect, state: &UiState, input: &InputState) {
    let block = Block::default().borders(Borders::ALL).title(" Stories ");
    match project(&state.stories) {
        RenderIntent::ShowLoading => {
            f.render_widget(Paragraph::new(LOADING_TEXT).block(block), area);
        }
        RenderIntent::ShowError => {
            let p = Paragraph::new(ERROR_TEXT)
                .style(Style::default().fg(Color::Red))
                .block(block.border_style(Style::default().fg(Color::Red)));
            f.render_widget(p, area);
        }
        RenderIntent::ShowList([]) => {
            f.render_widget(Paragraph::new(EMPTY_TEXT).block(block), area);
        }
        RenderIntent::ShowList(items) => {
            let list = List::new(items.iter().map(story_item))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!(" Stories ({}) ", items.len())),
                )
                .highlight_style(Style::default().bg(Color::DarkGray))
                .highlight_symbol("▶ ");
            let mut list_state = ListState::default();
            list_state.select(Some(input.selected.min(items.len() - 1)));
            f.render_stateful_widget(list, area, &mut list_state);
        }
    }
}

/// 绘制一帧
pub fn draw(f: &mut Frame, state: &UiState, input: &InputState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_search_box(f, chunks[0], state, input);
    draw_body(f, chunks[1], state, input);

    let hint = " Enter 提交 │ ↑↓ 选择 │ Del/Ctrl+D 移除 │ Ctrl+R 刷新 │ Esc/Ctrl+Q 退出 ";
    f.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        chunks[2],
    );
}
