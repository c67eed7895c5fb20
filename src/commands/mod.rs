mod article;
mod board;
mod comment;
mod expect;
mod key_press;
mod login;
mod screen;
mod search;
mod send_input;
mod show;
mod wait;

pub use article::{OpenArticle, Read};
pub use board::{ClassMenu, Favorite, OpenBoard};
pub use comment::Comment;
pub use expect::Expect;
pub use key_press::KeyPress;
pub use login::{Login, Logout};
pub use screen::ScreenDump;
pub use search::{Fetch, List, Search};
pub use send_input::SendInput;
pub use show::Show;
pub use wait::Wait;
