//! Configuration for a bot session.
//!
//! Configuration is read from a TOML file; every key is optional and falls
//! back to the defaults for the public PTT host:
//!
//! ```toml
//! host = "ptt.cc"
//! port = 23
//! protocol = "telnet"      # or "raw", or "websocket"
//! # Used by the websocket protocol instead of host and port.
//! url = "wss://ws.ptt.cc/bbs"
//! origin = "https://robertabcd.github.io"
//! charset = "big5"         # or "utf8"
//!
//! # Base timeout; a keystroke round trip waits ten times this long.
//! timeout_ms = 200
//! # Quiet period that ends a burst of screen updates.
//! settle_ms = 30
//! # Idle keepalive while logged in (omit to disable).
//! keepalive_ms = 60000
//!
//! [terminal]
//! rows = 24
//! columns = 80
//!
//! [login]
//! poll_interval_ms = 400
//! max_polls = 150
//!
//! [comment]
//! failure_policy = "skip"  # or "abort"
//!
//! [reconnect]
//! policy = "disabled"      # or "backoff"
//! ```

use crate::charset::Charset;
use crate::comment::FailurePolicy;
use crate::error::{BotError, Result};
use crate::reconnect::ReconnectPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Round trips wait this many base timeouts for a screen update.
const ROUND_TRIP_FACTOR: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Telnet,
    Raw,
    /// Binary frames through the host's web gateway.
    WebSocket,
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
    pub url: String,
    /// Origin header sent with the WebSocket handshake.
    pub origin: Option<String>,
    pub charset: Charset,
    pub terminal: TerminalConfig,
    pub timeout_ms: u64,
    pub settle_ms: u64,
    pub keepalive_ms: Option<u64>,
    pub login: LoginConfig,
    pub comment: CommentConfig,
    pub reconnect: ReconnectPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "PTT".to_string(),
            host: "ptt.cc".to_string(),
            port: 23,
            protocol: Protocol::Telnet,
            url: "wss://ws.ptt.cc/bbs".to_string(),
            origin: Some("https://robertabcd.github.io".to_string()),
            charset: Charset::Big5,
            terminal: TerminalConfig::default(),
            timeout_ms: 200,
            settle_ms: 30,
            keepalive_ms: None,
            login: LoginConfig::default(),
            comment: CommentConfig::default(),
            reconnect: ReconnectPolicy::Disabled,
        }
    }
}

/// Terminal geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub rows: usize,
    pub columns: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            rows: 24,
            columns: 80,
        }
    }
}

/// Login polling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub poll_interval_ms: u64,
    pub max_polls: u32,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 400,
            max_polls: 150,
        }
    }
}

/// Comment composer behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    pub failure_policy: FailurePolicy,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Wide glyphs need two columns.
        if self.terminal.rows < 4 || self.terminal.columns < 2 {
            return Err(BotError::Config(format!(
                "terminal must be at least 4 rows by 2 columns, got {}x{}",
                self.terminal.rows, self.terminal.columns
            )));
        }
        if self.protocol == Protocol::WebSocket
            && !(self.url.starts_with("ws://") || self.url.starts_with("wss://"))
        {
            return Err(BotError::Config(format!(
                "websocket url must start with ws:// or wss://, got '{}'",
                self.url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(BotError::Config("timeout_ms must be positive".into()));
        }
        if let Some(keepalive) = self.keepalive() {
            if keepalive <= self.round_trip_timeout() {
                return Err(BotError::Config(format!(
                    "keepalive_ms ({}) must exceed the round-trip timeout ({} ms)",
                    keepalive.as_millis(),
                    self.round_trip_timeout().as_millis()
                )));
            }
        }
        Ok(())
    }

    /// Where the session connects, for logs and error messages.
    pub fn endpoint(&self) -> String {
        match self.protocol {
            Protocol::WebSocket => self.url.clone(),
            Protocol::Telnet | Protocol::Raw => format!("{}:{}", self.host, self.port),
        }
    }

    /// How long a keystroke send waits for the next screen update.
    pub fn round_trip_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms) * ROUND_TRIP_FACTOR
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn keepalive(&self) -> Option<Duration> {
        self.keepalive_ms.map(Duration::from_millis)
    }

    pub fn login_poll_interval(&self) -> Duration {
        Duration::from_millis(self.login.poll_interval_ms)
    }
}
