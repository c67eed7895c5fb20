//! Error types for session and automation operations.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Session is not connected")]
    NotConnected,

    #[error("Operation requires a logged-in session")]
    NotAuthenticated,

    #[error("Refusing to send blank text")]
    EmptyInput,

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Search on board '{0}' matched nothing")]
    SearchFailed(String),

    #[error("Comment UI offered no confirmation path")]
    CommentRejected,

    #[error("Login did not complete after {0} polls")]
    LoginTimedOut(u32),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),
}

impl From<tokio_tungstenite::tungstenite::Error> for BotError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        BotError::WebSocket(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
