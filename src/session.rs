//! The session: connection state machine and keystroke round trips.
//!
//! A [`Session`] owns the host connection, the emulated terminal and the
//! [`SessionState`]. Keystrokes go out through [`Session::send`], which waits
//! for the next screen update. Because `send` takes `&mut self`, at most one
//! round trip can be in flight; there are no request ids, only ordering.
//!
//! State changes are broadcast as [`SessionEvent`]s to every receiver
//! obtained from [`Session::subscribe`].

use crate::charset::Codec;
use crate::config::{Config, Protocol};
use crate::error::{BotError, Result};
use crate::link::Link;
use crate::login::LoginFailure;
use crate::reconnect::ReconnectPolicy;
use crate::screen::ScreenBuffer;
use crate::terminal::{Terminal, VteTerminal};
use crate::transport::{self, Outbound, TransportEvent, Wire};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::{Instant, sleep, sleep_until, timeout, timeout_at};
use tracing::{debug, info, trace, warn};

const EVENT_CAPACITY: usize = 64;

/// Where the session currently is on the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pub boardname: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub connected: bool,
    pub logged_in: bool,
    pub username: Option<String>,
    /// Set on login; the board name is only updated once the screen header
    /// confirms it.
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Connected,
    LoggedIn,
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        match (self.connected, self.logged_in) {
            (false, _) => Phase::Disconnected,
            (true, false) => Phase::Connected,
            (true, true) => Phase::LoggedIn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    /// The connection ended, with the transport error if there was one.
    Disconnected(Option<String>),
    StateChanged(SessionState),
    LoginSucceeded,
    LoginFailed(LoginFailure),
    /// The screen text after an inbound update.
    Redraw(String),
}

pub struct Session {
    config: Config,
    terminal: Box<dyn Terminal>,
    screen: ScreenBuffer,
    codec: Codec,
    state: SessionState,
    events: broadcast::Sender<SessionEvent>,
    wire: Option<Wire>,
}

impl Session {
    /// Create a disconnected session with the default terminal emulator.
    pub fn new(config: Config) -> Self {
        let terminal = VteTerminal::new(config.terminal.rows, config.terminal.columns);
        Self::with_terminal(config, Box::new(terminal))
    }

    pub fn with_terminal(config: Config, terminal: Box<dyn Terminal>) -> Self {
        let screen = terminal.snapshot();
        let codec = Codec::new(config.charset);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            terminal,
            screen,
            codec,
            state: SessionState::default(),
            events,
            wire: None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Connect to the configured host and attach the connection.
    pub async fn connect(&mut self) -> Result<()> {
        match self.config.protocol {
            Protocol::WebSocket => {
                let stream = transport::websocket::connect(&self.config).await?;
                self.attach(stream);
            }
            Protocol::Telnet | Protocol::Raw => {
                let stream = transport::connect(&self.config).await?;
                self.attach(stream);
            }
        }
        Ok(())
    }

    /// Attach an already-open byte stream to the host.
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach<S>(&mut self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        if self.wire.is_some() {
            self.mark_disconnected(Some("replaced by a new connection".to_string()));
        }
        self.codec = Codec::new(self.config.charset);
        self.wire = Some(transport::spawn(stream, self.config.protocol));
        self.state.connected = true;
        info!("connected");
        self.emit(SessionEvent::Connected);
        self.emit_state();
    }

    pub fn disconnect(&mut self) {
        self.mark_disconnected(None);
    }

    /// Reconnect according to `policy`. Returns whether a connection was
    /// re-established; a disabled policy never tries.
    pub async fn reconnect(&mut self, policy: &ReconnectPolicy) -> Result<bool> {
        let mut attempt = 0;
        while let Some(delay) = policy.delay(attempt) {
            sleep(delay).await;
            match self.connect().await {
                Ok(()) => return Ok(true),
                Err(err) => warn!(attempt, %err, "reconnect attempt failed"),
            }
            attempt += 1;
        }
        Ok(false)
    }

    /// Send keystrokes and wait for the next screen update.
    ///
    /// Resolves `true` once an update has been applied and `false` if none
    /// arrives within the round-trip timeout. An empty payload resolves
    /// `true` without touching the wire.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::NotConnected`] if the session is not connected.
    pub async fn send(&mut self, payload: &str) -> Result<bool> {
        self.drain_pending();
        if !self.state.connected {
            return Err(BotError::NotConnected);
        }
        self.reschedule_keepalive();
        if payload.is_empty() {
            debug!("skipping zero-length payload");
            return Ok(true);
        }

        debug!(?payload, "send");
        let bytes = self.codec.encode(payload);
        self.transmit(Outbound::Payload(bytes))?;

        let wait = self.config.round_trip_timeout();
        let updated = match timeout(wait, self.next_update()).await {
            Ok(updated) => updated,
            Err(_) => {
                debug!(?wait, "no screen update before timeout");
                false
            }
        };
        if updated {
            self.settle().await;
        }
        Ok(updated)
    }

    /// Wait for `duration`, applying screen updates as they arrive.
    pub async fn pause(&mut self, duration: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        while let Ok(Some(event)) = timeout_at(deadline, self.next_event()).await {
            self.apply(event);
        }
        sleep_until(deadline).await;
        Ok(())
    }

    /// Apply updates that arrived while no round trip was pending, so the
    /// next `send` waits for a fresh one.
    fn drain_pending(&mut self) {
        loop {
            let Some(wire) = self.wire.as_mut() else {
                return;
            };
            match wire.inbound.try_recv() {
                Ok(event) => {
                    self.apply(event);
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.mark_disconnected(None);
                    return;
                }
            }
        }
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        match self.wire.as_mut() {
            Some(wire) => wire.inbound.recv().await,
            None => None,
        }
    }

    async fn next_update(&mut self) -> bool {
        loop {
            match self.next_event().await {
                Some(event) => {
                    if self.apply(event) {
                        return true;
                    }
                    if !self.state.connected {
                        return false;
                    }
                }
                None => {
                    self.mark_disconnected(None);
                    return false;
                }
            }
        }
    }

    /// Keep applying updates until the host goes quiet for the settle window.
    async fn settle(&mut self) {
        let quiet = self.config.settle();
        if quiet.is_zero() {
            return;
        }
        while let Ok(Some(event)) = timeout(quiet, self.next_event()).await {
            self.apply(event);
        }
    }

    /// Returns whether the screen changed.
    fn apply(&mut self, event: TransportEvent) -> bool {
        match event {
            TransportEvent::Data(bytes) => {
                self.codec.observe(&bytes, self.state.logged_in);
                let text = self.codec.decode(&bytes);
                self.terminal.write(&text);
                self.screen = self.terminal.snapshot();
                trace!(screen = %self.screen, "redraw");
                if self.events.receiver_count() > 0 {
                    self.emit(SessionEvent::Redraw(self.screen.to_string()));
                }
                true
            }
            TransportEvent::Closed(reason) => {
                self.mark_disconnected(reason);
                false
            }
        }
    }

    fn transmit(&mut self, message: Outbound) -> Result<()> {
        let delivered = self
            .wire
            .as_ref()
            .is_some_and(|wire| wire.outbound.send(message).is_ok());
        if delivered {
            Ok(())
        } else {
            self.mark_disconnected(Some("writer stopped".to_string()));
            Err(BotError::NotConnected)
        }
    }

    /// Restart the idle timer while logged in; clear it otherwise.
    fn reschedule_keepalive(&self) {
        let (Some(interval), Some(wire)) = (self.config.keepalive(), self.wire.as_ref()) else {
            return;
        };
        let interval = self.state.logged_in.then_some(interval);
        let _ = wire.outbound.send(Outbound::Keepalive(interval));
    }

    fn mark_disconnected(&mut self, reason: Option<String>) {
        // Dropping the wire stops the writer, and with it the keepalive.
        self.wire = None;
        if !self.state.connected {
            return;
        }
        self.state.connected = false;
        self.state.logged_in = false;
        self.state.position = None;
        info!(?reason, "disconnected");
        self.emit(SessionEvent::Disconnected(reason));
        self.emit_state();
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn emit_state(&self) {
        self.emit(SessionEvent::StateChanged(self.state.clone()));
    }
}

#[async_trait(?Send)]
impl Link for Session {
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
        Session::send(self, payload).await
    }

    async fn pause(&mut self, duration: Duration) -> Result<()> {
        Session::pause(self, duration).await
    }

    fn confirm_login(&mut self, username: &str) {
        self.state.logged_in = true;
        self.state.username = Some(username.to_string());
        self.state.position = Some(Position::default());
        info!(username, "logged in");
        self.emit_state();
        self.reschedule_keepalive();
    }

    fn confirm_logout(&mut self) {
        self.state.logged_in = false;
        self.state.position = None;
        info!("logged out");
        self.emit_state();
        self.reschedule_keepalive();
    }

    fn confirm_board(&mut self, boardname: &str) {
        self.state.position.get_or_insert_with(Position::default).boardname = boardname.to_string();
        debug!(boardname, "position confirmed");
        self.emit_state();
    }

    fn notify(&mut self, event: SessionEvent) {
        self.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase() {
        let mut state = SessionState::default();
        assert_eq!(state.phase(), Phase::Disconnected);
        state.connected = true;
        assert_eq!(state.phase(), Phase::Connected);
        state.logged_in = true;
        assert_eq!(state.phase(), Phase::LoggedIn);
        state.connected = false;
        assert_eq!(state.phase(), Phase::Disconnected);
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let mut session = Session::new(Config::default());
        assert!(matches!(session.send("x").await, Err(BotError::NotConnected)));
        assert!(matches!(session.send("").await, Err(BotError::NotConnected)));
    }

    #[tokio::test]
    async fn test_new_session_has_blank_screen() {
        let session = Session::new(Config::default());
        assert_eq!(session.screen().row_count(), 24);
        assert!(session.screen().rows().iter().all(|row| row.is_blank()));
        assert_eq!(session.state().phase(), Phase::Disconnected);
    }

    #[tokio::test]
    async fn test_redraw_event_carries_screen() {
        use tokio::io::AsyncWriteExt;

        let mut config = Config::default();
        config.protocol = crate::config::Protocol::Raw;
        let mut session = Session::new(config);
        let mut events = session.subscribe();
        let (client, mut host) = tokio::io::duplex(1024);
        session.attach(client);

        host.write_all(b"\x1b[3;1Hhello").await.unwrap();
        session.pause(Duration::from_millis(50)).await.unwrap();

        let mut redraws = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let SessionEvent::Redraw(text) = event {
                redraws.push(text);
            }
        }
        let last = redraws.last().expect("at least one redraw");
        assert_eq!(last.lines().nth(2).map(str::trim_end), Some("hello"));
        assert_eq!(*last, session.screen().to_string());
    }

    #[tokio::test]
    async fn test_pause_without_connection_still_waits() {
        let mut session = Session::new(Config::default());
        let start = Instant::now();
        session.pause(Duration::from_millis(30)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
