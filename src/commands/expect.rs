//! [`Expect`] command: blocks until text appears on the rendered screen.
//!
//! Script syntax:
//! - `expect "主功能表"` with the 5-second default timeout
//! - `expect "請輸入代號" 10s` with a custom timeout

use crate::command::{Context, ScriptCommand};
use crate::parser::{closing_quote, parse_duration, parse_quoted_string};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::time::Duration;

/// Blocks until `pattern` appears on some screen row, or until `timeout` elapses.
///
/// The screen is a snapshot rather than a stream, so text already on screen
/// matches immediately.
pub struct Expect {
    pub pattern: String,
    pub timeout: Duration,
}

impl Expect {
    pub const NAME: &'static str = "expect";

    /// Create an `Expect` command with the default 5-second timeout.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Create an `Expect` command with a custom timeout.
    pub fn with_timeout(pattern: impl Into<String>, timeout: Duration) -> Self {
        Self {
            pattern: pattern.into(),
            timeout,
        }
    }
}

#[async_trait(?Send)]
impl ScriptCommand for Expect {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        let args = args.trim();
        if !args.starts_with('"') {
            return Err(anyhow!("Expected quoted string after 'expect'"));
        }
        let end_idx =
            closing_quote(args).ok_or_else(|| anyhow!("Unclosed quote in expect command"))?;
        let pattern = parse_quoted_string(&args[..=end_idx])?;
        let remainder = args[end_idx + 1..].trim();

        if remainder.is_empty() {
            Ok(Self::new(pattern))
        } else {
            Ok(Self::with_timeout(pattern, parse_duration(remainder)?))
        }
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        ctx.wait_for_screen(&self.pattern, self.timeout).await
    }
}
