use crate::command::{Context, ScriptCommand};
use crate::config::Config;
use crate::session::Session;
use anyhow::{Context as _, Result};
use std::io::{self, Write};
use tracing::{debug, info, warn};

/// Runs script commands against one [`Session`].
pub struct Engine {
    ctx: Context,
}

impl Engine {
    /// Connect to the configured host. Command output goes to stdout.
    pub async fn connect(config: Config) -> Result<Self> {
        Self::connect_with_handler(config, |data| {
            let mut stdout = io::stdout();
            let _ = stdout.write_all(data);
            let _ = stdout.flush();
        })
        .await
    }

    /// Connect to the configured host, passing command output to `handler`
    /// instead of stdout.
    pub async fn connect_with_handler<F>(config: Config, handler: F) -> Result<Self>
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        let endpoint = config.endpoint();
        let mut session = Session::new(config);
        session
            .connect()
            .await
            .with_context(|| format!("Failed to connect to {endpoint}"))?;
        Ok(Self::with_session(session, handler))
    }

    /// Drive an existing session, e.g. one attached to an in-memory stream.
    pub fn with_session<F>(session: Session, handler: F) -> Self
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        Self {
            ctx: Context::new(session, handler),
        }
    }

    pub fn session(&self) -> &Session {
        self.ctx.session()
    }

    pub fn session_mut(&mut self) -> &mut Session {
        self.ctx.session_mut()
    }

    /// Execute `commands` in order, stopping at the first failure.
    pub async fn execute(&mut self, commands: Vec<Box<dyn ScriptCommand>>) -> Result<()> {
        for (index, command) in commands.iter().enumerate() {
            self.restore_connection().await?;
            debug!(index, command = command.name(), "executing");
            command
                .execute(&mut self.ctx)
                .await
                .with_context(|| format!("Command {} ('{}') failed", index + 1, command.name()))?;
        }
        info!(count = commands.len(), "script finished");
        Ok(())
    }

    /// Reconnect before the next command if the link dropped and the
    /// configured policy allows it. Without a policy the command runs as is;
    /// commands that need the host then fail with a not-connected error.
    async fn restore_connection(&mut self) -> Result<()> {
        let session = self.ctx.session_mut();
        if session.state().connected {
            return Ok(());
        }
        let policy = session.config().reconnect.clone();
        if !policy.is_enabled() {
            return Ok(());
        }
        warn!("connection lost, reconnecting");
        if !session.reconnect(&policy).await? {
            anyhow::bail!("Reconnect attempts exhausted");
        }
        Ok(())
    }
}
