//! Board navigation commands.
//!
//! Script syntax:
//! - `board "Gossiping"` opens a board by name
//! - `class 1 -1` walks the class menu by entry offsets
//! - `favorite 2` walks the favorites menu
//!
//! Negative offsets count from the last entry on screen; `-1` is the last.

use crate::command::{Context, ScriptCommand};
use crate::navigation::{enter_board_by_name, enter_board_by_offset, enter_favorite};
use crate::parser::parse_args;
use anyhow::{Context as _, Result, anyhow};
use async_trait::async_trait;

pub struct OpenBoard {
    pub boardname: String,
}

impl OpenBoard {
    pub const NAME: &'static str = "board";
}

#[async_trait(?Send)]
impl ScriptCommand for OpenBoard {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        match parse_args(args)?.as_slice() {
            [boardname] => Ok(Self {
                boardname: boardname.clone(),
            }),
            _ => Err(anyhow!("Usage: board \"Name\"")),
        }
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        enter_board_by_name(&mut ctx.session, &self.boardname).await?;
        Ok(())
    }
}

fn parse_offsets(args: &str) -> Result<Vec<i64>> {
    let offsets = args
        .split_whitespace()
        .map(|word| {
            word.parse::<i64>()
                .with_context(|| format!("Invalid menu offset: '{}'", word))
        })
        .collect::<Result<Vec<_>>>()?;
    if offsets.is_empty() {
        return Err(anyhow!("Expected at least one menu offset"));
    }
    Ok(offsets)
}

pub struct ClassMenu {
    pub offsets: Vec<i64>,
}

impl ClassMenu {
    pub const NAME: &'static str = "class";
}

#[async_trait(?Send)]
impl ScriptCommand for ClassMenu {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        Ok(Self {
            offsets: parse_offsets(args)?,
        })
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        enter_board_by_offset(&mut ctx.session, &self.offsets).await?;
        Ok(())
    }
}

pub struct Favorite {
    pub offsets: Vec<i64>,
}

impl Favorite {
    pub const NAME: &'static str = "favorite";
}

#[async_trait(?Send)]
impl ScriptCommand for Favorite {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        Ok(Self {
            offsets: parse_offsets(args)?,
        })
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        enter_favorite(&mut ctx.session, &self.offsets).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ScriptCommand;

    #[test]
    fn test_parse_board() {
        assert_eq!(OpenBoard::parse(r#""C_Chat""#).unwrap().boardname, "C_Chat");
        assert!(OpenBoard::parse("").is_err());
    }

    #[test]
    fn test_parse_offsets() {
        assert_eq!(ClassMenu::parse("1 -1 3").unwrap().offsets, vec![1, -1, 3]);
        assert_eq!(Favorite::parse("2").unwrap().offsets, vec![2]);
        assert!(Favorite::parse("").is_err());
        assert!(ClassMenu::parse("one").is_err());
    }
}
