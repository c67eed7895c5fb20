//! The contract between the automation flows and a live session.
//!
//! Login, paging, commenting, navigation and search are written against
//! [`Link`] instead of [`Session`](crate::Session) directly. They only read
//! the current screen, send keystrokes, and report the state transitions
//! they have confirmed on screen.

use crate::config::Config;
use crate::error::{BotError, Result};
use crate::screen::ScreenBuffer;
use crate::session::{SessionEvent, SessionState};
use async_trait::async_trait;
use std::time::Duration;

#[async_trait(?Send)]
pub trait Link {
    fn config(&self) -> &Config;

    /// Snapshot of the display as of the last applied update.
    fn screen(&self) -> &ScreenBuffer;

    fn state(&self) -> &SessionState;

    /// Send keystrokes and wait for the next screen update.
    ///
    /// Resolves `false` when no update arrives in time; that is not an error,
    /// the screen may simply not have changed.
    async fn send(&mut self, payload: &str) -> Result<bool>;

    /// Wait, applying any screen updates that arrive meanwhile.
    async fn pause(&mut self, duration: Duration) -> Result<()>;

    /// Record a login confirmed by the main-menu marker.
    fn confirm_login(&mut self, username: &str);

    fn confirm_logout(&mut self);

    /// Record the board name just confirmed against the screen header.
    fn confirm_board(&mut self, boardname: &str);

    /// Broadcast a flow-level event to subscribers.
    fn notify(&mut self, event: SessionEvent);

    fn require_login(&self) -> Result<()> {
        if self.state().logged_in {
            Ok(())
        } else {
            Err(BotError::NotAuthenticated)
        }
    }
}
