//! [`ScreenDump`] command: writes the current screen to the output handler.
//!
//! Script syntax: `screen`

use crate::command::{Context, ScriptCommand};
use anyhow::{Result, anyhow};
use async_trait::async_trait;

pub struct ScreenDump;

impl ScreenDump {
    pub const NAME: &'static str = "screen";
}

#[async_trait(?Send)]
impl ScriptCommand for ScreenDump {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        if !args.trim().is_empty() {
            return Err(anyhow!("'screen' takes no arguments"));
        }
        Ok(Self)
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        let dump = ctx.session.screen().to_string();
        ctx.emit_line(&dump);
        Ok(())
    }
}
