//! The [`ScriptCommand`] trait and the [`Context`] type commands receive when executed.

use crate::session::Session;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

type OutputHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// How often `wait_for_screen` re-checks while the screen stays quiet.
const SCREEN_POLL: Duration = Duration::from_millis(50);

/// Execution context passed to [`ScriptCommand::execute`].
///
/// Owns the [`Session`] commands drive and the output handler results are
/// written to.
pub struct Context {
    pub(crate) session: Session,
    pub(crate) output_handler: OutputHandler,
}

impl Context {
    pub fn new<F>(session: Session, handler: F) -> Self
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        Self {
            session,
            output_handler: Arc::new(handler),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Pass bytes through the output handler (e.g. to stdout or a custom sink).
    pub fn emit(&self, data: &[u8]) {
        (self.output_handler)(data);
    }

    /// Emit `line` followed by a newline.
    pub fn emit_line(&self, line: &str) {
        let mut data = String::with_capacity(line.len() + 1);
        data.push_str(line);
        data.push('\n');
        self.emit(data.as_bytes());
    }

    /// Block until some screen row contains `pattern`, or until `timeout`
    /// elapses. Screen updates keep being applied while waiting.
    pub async fn wait_for_screen(&mut self, pattern: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self
                .session
                .screen()
                .rows()
                .iter()
                .any(|row| row.contains(pattern))
            {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(anyhow!("Timeout waiting for pattern: '{}'", pattern));
            }
            self.session.pause((deadline - now).min(SCREEN_POLL)).await?;
        }
    }
}

/// A single script command.
///
/// Implement this trait to add a new command to the engine. Then:
///
/// 1. Define `pub const NAME: &'static str` on your struct, the script
///    keyword (e.g. `"login"`, `"expect"`) used by the parser.
/// 2. Re-export the struct from `src/commands/mod.rs`.
/// 3. Add one entry to the `REGISTRY` in [`crate::parser`]:
///    `(MyCmd::NAME, MyCmd::parse_boxed)`.
#[async_trait(?Send)]
pub trait ScriptCommand: 'static {
    /// The command name, accessible at runtime through a trait object.
    ///
    /// Implementations should return their `NAME` constant:
    /// `fn name(&self) -> &'static str { Self::NAME }`.
    fn name(&self) -> &'static str;

    /// Parse this command from the argument string (everything after the
    /// command keyword on the script line).
    fn parse(args: &str) -> Result<Self>
    where
        Self: Sized;

    /// Parse and box this command. Used as the function-pointer type stored in
    /// the command registry; the default implementation calls [`parse`](Self::parse)
    /// and boxes the result.
    fn parse_boxed(args: &str) -> Result<Box<dyn ScriptCommand>>
    where
        Self: Sized,
    {
        Ok(Box::new(Self::parse(args)?))
    }

    /// Execute the command using the provided engine context.
    async fn execute(&self, ctx: &mut Context) -> Result<()>;
}
