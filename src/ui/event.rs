//! 事件处理
//!
//! 轮询 crossterm 键盘事件，将 Ctrl+C/Ctrl+Q/Esc 转为 Quit、Ctrl+R 转为 Refresh，
//! 其余按键交给 run_app 处理输入框与列表选择。

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::core::Command;

/// 应用事件：来自快捷键的 Command 或原始 KeyEvent
#[derive(Debug, Clone)]
pub enum AppEvent {
    Command(Command),
    Key(KeyEvent),
}

/// 事件处理器：持有 cmd_tx，poll 时读键盘并返回 AppEvent
pub struct EventHandler {
    cmd_tx: mpsc::UnboundedSender<Command>,
    poll_interval: Duration,
}

impl EventHandler {
    pub fn new(cmd_tx: mpsc::UnboundedSender<Command>, poll_interval: Duration) -> Self {
        Self {
            cmd_tx,
            poll_interval,
        }
    }

    pub fn poll(&self) -> anyhow::Result<Option<AppEvent>> {
        if event::poll(self.poll_interval)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Some(classify_key(key)));
                }
            }
        }
        Ok(None)
    }

    /// 发送命令；编排器已退出时忽略
    pub fn send(&self, cmd: Command) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::debug!("Orchestrator gone, command dropped");
        }
    }
}

/// 全局快捷键优先，其余作为普通按键
pub fn classify_key(key: KeyEvent) -> AppEvent {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => AppEvent::Command(Command::Quit),
        KeyCode::Char('r') if ctrl => AppEvent::Command(Command::Refresh),
        KeyCode::Esc => AppEvent::Command(Command::Quit),
        _ => AppEvent::Key(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_shortcuts() {
        let quit = classify_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert!(matches!(quit, AppEvent::Command(Command::Quit)));

        let refresh = classify_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
        assert!(matches!(refresh, AppEvent::Command(Command::Refresh)));

        let esc = classify_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert!(matches!(esc, AppEvent::Command(Command::Quit)));

        let plain = classify_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE));
        assert!(matches!(plain, AppEvent::Key(_)));
    }
}
