//! TUI 应用主循环
//!
//! 进入全屏/原始模式，轮询 state_rx 与键盘事件，将输入、提交、移除转为 Command 发送给编排器，
//! 每帧用 draw 渲染最新的 UiState 与输入缓冲。

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};

use crate::core::{project, submit_enabled, Command, RenderIntent, Story, UiState};
use crate::ui::event::{AppEvent, EventHandler};
use crate::ui::render::draw;

/// 输入框与列表选择的本地状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    pub buffer: String,
    pub selected: usize,
}

impl InputState {
    pub fn new(query: &str) -> Self {
        Self {
            buffer: query.to_string(),
            selected: 0,
        }
    }

    /// 处理一个普通按键，返回需要发给编排器的命令
    pub fn handle_key(&mut self, key: KeyEvent, state: &UiState) -> Option<Command> {
        let visible: &[Story] = match project(&state.stories) {
            RenderIntent::ShowList(items) => items,
            _ => &[],
        };
        match key.code {
            KeyCode::Enter => submit_enabled(&self.buffer).then_some(Command::Submit),
            KeyCode::Backspace => {
                self.buffer.pop()?;
                Some(Command::Input(self.buffer.clone()))
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.remove_selected(visible)
            }
            KeyCode::Delete => self.remove_selected(visible),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.buffer.push(c);
                Some(Command::Input(self.buffer.clone()))
            }
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                self.selected = (self.selected + 1).min(visible.len().saturating_sub(1));
                None
            }
            KeyCode::Home => {
                self.selected = 0;
                None
            }
            KeyCode::End => {
                self.selected = visible.len().saturating_sub(1);
                None
            }
            _ => None,
        }
    }

    fn remove_selected(&self, visible: &[Story]) -> Option<Command> {
        let story = visible.get(self.selected)?;
        Some(Command::Remove(story.id.clone()))
    }

    /// 列表变化后把选择限制在有效范围内
    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

/// 运行 TUI：启用原始模式与全屏，循环 poll 事件 + 渲染，退出时恢复终端
pub async fn run_app(
    mut state_rx: watch::Receiver<UiState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    poll_interval: Duration,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut state_rx, cmd_tx, poll_interval).await;

    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state_rx: &mut watch::Receiver<UiState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    poll_interval: Duration,
) -> anyhow::Result<()> {
    let event_handler = EventHandler::new(cmd_tx, poll_interval);
    let mut input_state = InputState::new(&state_rx.borrow().query);

    loop {
        let state = state_rx.borrow_and_update().clone();
        input_state.clamp(state.stories.items.len());

        if let Some(ev) = event_handler.poll()? {
            match ev {
                AppEvent::Command(Command::Quit) => {
                    event_handler.send(Command::Quit);
                    break;
                }
                AppEvent::Command(cmd) => event_handler.send(cmd),
                AppEvent::Key(key) => {
                    if let Some(cmd) = input_state.handle_key(key, &state) {
                        event_handler.send(cmd);
                    }
                }
            }
        }

        terminal.draw(|f| draw(f, &state, &input_state))?;

        tokio::task::yield_now().await;
    }
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
