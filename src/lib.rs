//! # pttbot
//!
//! A screen-driven automation client for the PTT bulletin board.
//!
//! The host is a full-screen terminal application, so pttbot works the way a
//! person does: it sends keystrokes, waits for the screen to redraw and reads
//! the result back off an emulated 24x80 terminal. On top of that round trip
//! it provides login, board navigation, article reading, comment posting and
//! search, plus a small scripting language to chain them.
//!
//! ## Quick start
//!
//! ```no_run
//! use pttbot::{Config, Engine, parse_str};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let script = r#"
//! login "guest" "secret"
//! board "Test"
//! list "Test"
//! logout
//! "#;
//!
//!     let commands = parse_str(script)?;
//!     let mut engine = Engine::connect(Config::default()).await?;
//!     engine.execute(commands).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Using the library directly
//!
//! Every operation is an async function over a [`Link`], implemented by
//! [`Session`]:
//!
//! ```no_run
//! use pttbot::{Config, Session, login, navigation};
//!
//! # async fn demo() -> pttbot::Result<()> {
//! let mut session = Session::new(Config::default());
//! session.connect().await?;
//! if login::login(&mut session, "guest", "secret", true).await? {
//!     navigation::enter_board_by_name(&mut session, "Test").await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Script syntax
//!
//! | Command | Description |
//! |---------|-------------|
//! | `login "user" "pass" [keep]` | Log in; `keep` leaves other sessions alone |
//! | `logout` | Log out and close the session on the host |
//! | `board "Name"` | Enter a board by name |
//! | `class 1 -1` | Walk the class menu by offsets and enter the board |
//! | `favorite 2` | Enter a board from the favorites list |
//! | `article "#AID"` / `article "Board" "#AID"` | Open an article by id |
//! | `read` | Print the article currently open |
//! | `comment push "text" ["Board" "#AID"]` | Post a comment (`push`, `boo`, `arrow`) |
//! | `list "Board" [id] [filters]` | Print one listing page |
//! | `search "Board" filters [pages N]` | Print search result pages |
//! | `fetch "Board" id [filters]` | Print one article of a listing or search |
//! | `send "keys"` | Send raw keystrokes |
//! | `key PageDown` | Send a named key |
//! | `expect "pattern" [5s]` | Wait until the screen shows `pattern` |
//! | `wait 500ms` | Pause while applying screen updates |
//! | `show "text"` | Write text to the output handler |
//! | `screen` | Print the current screen |
//! | `# comment` | Full-line or inline comment |
//!
//! Filters are `author "x"`, `title "x"` and `push "x"`.
//!
//! ## Implementing a custom command
//!
//! Implement [`ScriptCommand`] to add new commands to the engine:
//!
//! ```no_run
//! use pttbot::command::{Context, ScriptCommand};
//! use async_trait::async_trait;
//! use anyhow::Result;
//!
//! pub struct Refresh;
//!
//! impl Refresh {
//!     pub const NAME: &'static str = "refresh";
//! }
//!
//! #[async_trait(?Send)]
//! impl ScriptCommand for Refresh {
//!     fn name(&self) -> &'static str { Self::NAME }
//!
//!     fn parse(_args: &str) -> Result<Self> {
//!         Ok(Self)
//!     }
//!
//!     async fn execute(&self, ctx: &mut Context) -> Result<()> {
//!         ctx.session_mut().send("\x0c").await?; // Ctrl+L redraws
//!         Ok(())
//!     }
//! }
//! ```

pub mod article;
pub mod charset;
pub mod command;
pub mod commands;
pub mod comment;
pub mod config;
pub mod engine;
pub mod error;
pub mod keys;
pub mod link;
pub mod login;
pub mod navigation;
pub mod pager;
pub mod parser;
pub mod reconnect;
pub mod screen;
pub mod search;
pub mod session;
pub mod terminal;
pub mod transport;
pub mod width;

#[cfg(test)]
mod testing;

pub use article::Article;
pub use charset::Charset;
pub use command::{Context, ScriptCommand};
pub use comment::{CommentKind, CommentReport, FailurePolicy};
pub use config::{Config, Protocol};
pub use engine::Engine;
pub use error::{BotError, Result};
pub use link::Link;
pub use login::LoginFailure;
pub use parser::{parse_file, parse_str};
pub use reconnect::ReconnectPolicy;
pub use screen::{Row, ScreenBuffer};
pub use search::{ArticleQuery, Filter};
pub use session::{Phase, Position, Session, SessionEvent, SessionState};
