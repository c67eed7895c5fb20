//! [`SendInput`] command: sends keystrokes and waits for the screen to answer.
//!
//! Script syntax: `send "text here"`

use crate::command::{Context, ScriptCommand};
use crate::parser::parse_quoted_string;
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Sends keystrokes as-is. Nothing is appended; use `key Enter` or `\r` to
/// submit a line.
pub struct SendInput {
    pub keys: String,
}

impl SendInput {
    pub const NAME: &'static str = "send";

    pub fn new(keys: impl Into<String>) -> Self {
        Self { keys: keys.into() }
    }
}

#[async_trait(?Send)]
impl ScriptCommand for SendInput {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        Ok(Self::new(parse_quoted_string(args)?))
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        let updated = ctx.session.send(&self.keys).await?;
        if !updated {
            debug!(keys = ?self.keys, "screen did not change");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ScriptCommand;

    #[test]
    fn test_parse() {
        let cmd = SendInput::parse(r#""hello""#).unwrap();
        assert_eq!(cmd.keys, "hello");
    }

    #[test]
    fn test_carriage_return_escape() {
        let cmd = SendInput::parse(r#""G\rY\r""#).unwrap();
        assert_eq!(cmd.keys, "G\rY\r");
    }

    #[test]
    fn test_parse_unclosed_quote() {
        assert!(SendInput::parse(r#""unclosed"#).is_err());
    }
}
