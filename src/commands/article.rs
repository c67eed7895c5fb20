//! Article commands.
//!
//! Script syntax:
//! - `article "Board" "#1abcDEF"` opens an article by id on a board
//! - `article "#1abcDEF"` opens it on the board already open
//! - `read` writes the open article to the output handler

use crate::command::{Context, ScriptCommand};
use crate::navigation::{enter_article_by_aid, enter_article_by_aid_from_board};
use crate::pager::read_content;
use crate::parser::parse_args;
use anyhow::{Result, anyhow};
use async_trait::async_trait;

pub struct OpenArticle {
    pub boardname: Option<String>,
    pub aid: String,
}

impl OpenArticle {
    pub const NAME: &'static str = "article";
}

#[async_trait(?Send)]
impl ScriptCommand for OpenArticle {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        match parse_args(args)?.as_slice() {
            [aid] => Ok(Self {
                boardname: None,
                aid: aid.clone(),
            }),
            [boardname, aid] => Ok(Self {
                boardname: Some(boardname.clone()),
                aid: aid.clone(),
            }),
            _ => Err(anyhow!("Usage: article [\"Board\"] \"AID\"")),
        }
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        match &self.boardname {
            Some(boardname) => enter_article_by_aid(&mut ctx.session, boardname, &self.aid).await?,
            None => enter_article_by_aid_from_board(&mut ctx.session, &self.aid).await?,
        }
        Ok(())
    }
}

pub struct Read;

impl Read {
    pub const NAME: &'static str = "read";
}

#[async_trait(?Send)]
impl ScriptCommand for Read {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        if !args.trim().is_empty() {
            return Err(anyhow!("'read' takes no arguments"));
        }
        Ok(Self)
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        let rows = read_content(&mut ctx.session).await?;
        for row in &rows {
            ctx.emit_line(row.text());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ScriptCommand;

    #[test]
    fn test_parse_article() {
        let cmd = OpenArticle::parse(r##""Test" "#1abcDEF""##).unwrap();
        assert_eq!(cmd.boardname.as_deref(), Some("Test"));
        assert_eq!(cmd.aid, "#1abcDEF");

        let cmd = OpenArticle::parse(r#""1abcDEF""#).unwrap();
        assert_eq!(cmd.boardname, None);
        assert!(OpenArticle::parse("").is_err());
    }
}
