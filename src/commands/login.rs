//! [`Login`] and [`Logout`] commands.
//!
//! Script syntax:
//! - `login "user" "password"` closes other sessions of the account
//! - `login "user" "password" keep` leaves them open
//! - `logout`

use crate::command::{Context, ScriptCommand};
use crate::login::{login, logout};
use crate::parser::parse_args;
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use tracing::warn;

pub struct Login {
    pub username: String,
    pub password: String,
    /// Close the account's other connections if the host asks.
    pub kick: bool,
}

impl Login {
    pub const NAME: &'static str = "login";
}

#[async_trait(?Send)]
impl ScriptCommand for Login {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        let words = parse_args(args)?;
        let (username, password, kick) = match words.as_slice() {
            [user, pass] => (user, pass, true),
            [user, pass, flag] if flag == "keep" => (user, pass, false),
            _ => return Err(anyhow!("Usage: login \"user\" \"password\" [keep]")),
        };
        Ok(Self {
            username: username.clone(),
            password: password.clone(),
            kick,
        })
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        if !login(&mut ctx.session, &self.username, &self.password, self.kick).await? {
            bail!("Login rejected for '{}'", self.username);
        }
        Ok(())
    }
}

pub struct Logout;

impl Logout {
    pub const NAME: &'static str = "logout";
}

#[async_trait(?Send)]
impl ScriptCommand for Logout {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        if !args.trim().is_empty() {
            return Err(anyhow!("'logout' takes no arguments"));
        }
        Ok(Self)
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        if !logout(&mut ctx.session).await? {
            warn!("logout requested while not logged in");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ScriptCommand;

    #[test]
    fn test_parse_login() {
        let cmd = Login::parse(r#""guest" "p@ss word""#).unwrap();
        assert_eq!(cmd.username, "guest");
        assert_eq!(cmd.password, "p@ss word");
        assert!(cmd.kick);
    }

    #[test]
    fn test_parse_keep() {
        assert!(!Login::parse(r#""guest" "pw" keep"#).unwrap().kick);
    }

    #[test]
    fn test_parse_login_errors() {
        assert!(Login::parse(r#""guest""#).is_err());
        assert!(Login::parse(r#""guest" "pw" kick"#).is_err());
        assert!(Logout::parse("now").is_err());
    }
}
