//! [`KeyPress`] command: sends one named key.
//!
//! Script syntax: `key Enter`, `key PgDown`, `key Ctrl+U`

use crate::command::{Context, ScriptCommand};
use crate::keys;
use anyhow::{Result, anyhow};
use async_trait::async_trait;

pub struct KeyPress {
    pub key: String,
    pub bytes: String,
}

impl KeyPress {
    pub const NAME: &'static str = "key";
}

#[async_trait(?Send)]
impl ScriptCommand for KeyPress {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        let key = args.trim();
        let bytes = keys::by_name(key).ok_or_else(|| anyhow!("Unknown key: '{}'", key))?;
        Ok(Self {
            key: key.to_string(),
            bytes,
        })
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        ctx.session.send(&self.bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ScriptCommand;

    #[test]
    fn test_parse_named_key() {
        let cmd = KeyPress::parse("PgDown").unwrap();
        assert_eq!(cmd.bytes, keys::PAGE_DOWN);
    }

    #[test]
    fn test_parse_ctrl_key() {
        assert_eq!(KeyPress::parse("Ctrl+U").unwrap().bytes, keys::CTRL_U);
    }

    #[test]
    fn test_parse_unknown_key() {
        assert!(KeyPress::parse("Hyper+Q").is_err());
    }
}
