//! A scripted [`Link`] for exercising the flows without a host.

use crate::config::Config;
use crate::error::{BotError, Result};
use crate::link::Link;
use crate::screen::ScreenBuffer;
use crate::session::{Position, SessionEvent, SessionState};
use crate::width::get_width;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

/// Build a standard 24x80 screen from `(row, text)` pairs.
pub(crate) fn screen(lines: &[(usize, &str)]) -> ScreenBuffer {
    ScreenBuffer::from_lines(lines, 24, 80)
}

fn pad_left(s: &str, width: usize) -> String {
    format!("{}{s}", " ".repeat(width.saturating_sub(get_width(s))))
}

fn pad_right(s: &str, width: usize) -> String {
    format!("{s}{}", " ".repeat(width.saturating_sub(get_width(s))))
}

/// One board listing row in the host's column layout.
pub(crate) fn listing_row(number: &str, push: &str, date: &str, author: &str, title: &str) -> String {
    format!(
        " {} {}{} {} □ {title}",
        pad_left(number, 7),
        pad_right(push, 2),
        pad_left(date, 5),
        pad_right(author, 12)
    )
}

/// Replays canned screens: each non-empty `send` consumes one entry of
/// `replies` and each `pause` consumes one entry of `ticks`.
pub(crate) struct ScriptedLink {
    pub(crate) config: Config,
    pub(crate) screen: ScreenBuffer,
    pub(crate) state: SessionState,
    /// `None` simulates a round trip that times out.
    pub(crate) replies: VecDeque<Option<ScreenBuffer>>,
    pub(crate) ticks: VecDeque<ScreenBuffer>,
    pub(crate) sent: Vec<String>,
    pub(crate) pauses: usize,
    pub(crate) events: Vec<SessionEvent>,
}

impl ScriptedLink {
    pub(crate) fn new() -> Self {
        Self {
            config: Config::default(),
            screen: screen(&[]),
            state: SessionState {
                connected: true,
                ..SessionState::default()
            },
            replies: VecDeque::new(),
            ticks: VecDeque::new(),
            sent: Vec::new(),
            pauses: 0,
            events: Vec::new(),
        }
    }

    pub(crate) fn logged_in(username: &str) -> Self {
        let mut link = Self::new();
        link.state.logged_in = true;
        link.state.username = Some(username.to_string());
        link.state.position = Some(Position::default());
        link
    }

    pub(crate) fn showing(mut self, current: ScreenBuffer) -> Self {
        self.screen = current;
        self
    }

    pub(crate) fn reply(mut self, next: ScreenBuffer) -> Self {
        self.replies.push_back(Some(next));
        self
    }

    pub(crate) fn silent(mut self) -> Self {
        self.replies.push_back(None);
        self
    }

    pub(crate) fn tick(mut self, next: ScreenBuffer) -> Self {
        self.ticks.push_back(next);
        self
    }

    pub(crate) fn boardname(&self) -> Option<&str> {
        self.state.position.as_ref().map(|p| p.boardname.as_str())
    }
}

#[async_trait(?Send)]
impl Link for ScriptedLink {
    fn config(&self) -> &Config {
        &self.config
    }

    fn screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    fn state(&self) -> &SessionState {
        &self.state
    }

    async fn send(&mut self, payload: &str) -> Result<bool> {
        if !self.state.connected {
            return Err(BotError::NotConnected);
        }
        if payload.is_empty() {
            return Ok(true);
        }
        self.sent.push(payload.to_string());
        match self.replies.pop_front() {
            Some(Some(next)) => {
                self.screen = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn pause(&mut self, _duration: Duration) -> Result<()> {
        self.pauses += 1;
        if let Some(next) = self.ticks.pop_front() {
            self.screen = next;
        }
        Ok(())
    }

    fn confirm_login(&mut self, username: &str) {
        self.state.logged_in = true;
        self.state.username = Some(username.to_string());
        self.state.position = Some(Position::default());
        self.events.push(SessionEvent::StateChanged(self.state.clone()));
    }

    fn confirm_logout(&mut self) {
        self.state.logged_in = false;
        self.state.position = None;
        self.events.push(SessionEvent::StateChanged(self.state.clone()));
    }

    fn confirm_board(&mut self, boardname: &str) {
        self.state.position.get_or_insert_with(Position::default).boardname = boardname.to_string();
        self.events.push(SessionEvent::StateChanged(self.state.clone()));
    }

    fn notify(&mut self, event: SessionEvent) {
        self.events.push(event);
    }
}
