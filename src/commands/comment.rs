//! [`Comment`] command.
//!
//! Script syntax:
//! - `comment push "text"` comments on the article already open
//! - `comment boo "text" "Board" "#1abcDEF"` finds the article first
//!
//! The kind is `push`, `boo` or `arrow`.

use crate::command::{Context, ScriptCommand};
use crate::comment::{CommentKind, comment, comment_by_aid};
use crate::parser::parse_args;
use anyhow::{Result, anyhow};
use async_trait::async_trait;

pub struct Comment {
    pub kind: CommentKind,
    pub text: String,
    /// Board and article id, when the article has to be found first.
    pub target: Option<(String, String)>,
}

impl Comment {
    pub const NAME: &'static str = "comment";
}

#[async_trait(?Send)]
impl ScriptCommand for Comment {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        let words = parse_args(args)?;
        let (kind, text, target) = match words.as_slice() {
            [kind, text] => (kind, text, None),
            [kind, text, boardname, aid] => (kind, text, Some((boardname.clone(), aid.clone()))),
            _ => {
                return Err(anyhow!(
                    "Usage: comment push|boo|arrow \"text\" [\"Board\" \"AID\"]"
                ));
            }
        };
        Ok(Self {
            kind: kind.parse().map_err(|e: String| anyhow!(e))?,
            text: text.clone(),
            target,
        })
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        let report = match &self.target {
            Some((boardname, aid)) => {
                comment_by_aid(&mut ctx.session, boardname, aid, self.kind, &self.text).await?
            }
            None => comment(&mut ctx.session, self.kind, &self.text).await?,
        };
        ctx.emit_line(&format!(
            "{}: {}/{} lines posted",
            self.kind, report.sent, report.chunks
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ScriptCommand;

    #[test]
    fn test_parse_in_place() {
        let cmd = Comment::parse(r#"push "好文""#).unwrap();
        assert_eq!(cmd.kind, CommentKind::Push);
        assert_eq!(cmd.text, "好文");
        assert!(cmd.target.is_none());
    }

    #[test]
    fn test_parse_by_aid() {
        let cmd = Comment::parse(r##"arrow "note" "Test" "#1abcDEF""##).unwrap();
        assert_eq!(cmd.kind, CommentKind::Arrow);
        assert_eq!(
            cmd.target,
            Some(("Test".to_string(), "#1abcDEF".to_string()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Comment::parse(r#"like "x""#).is_err());
        assert!(Comment::parse(r#"push"#).is_err());
        assert!(Comment::parse(r#"push "x" "Test""#).is_err());
    }
}
