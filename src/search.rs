//! Board listings and article search.
//!
//! An [`ArticleQuery`] names a board and, optionally, search filters and a
//! target listing id. Filters are typed into the board view as the host's
//! search keystrokes, in the order they were added.
//!
//! ```no_run
//! use pttbot::search::{ArticleQuery, Filter};
//! # async fn demo(session: &mut pttbot::Session) -> pttbot::Result<()> {
//! let query = ArticleQuery::new()
//!     .filter(Filter::Boardname("Gossiping".into()))
//!     .filter(Filter::Author("someone".into()));
//! let mut pages = query.pages(session);
//! while let Some(articles) = pages.next_page().await? {
//!     println!("{} articles", articles.len());
//! }
//! # Ok(())
//! # }
//! ```

use crate::article::{Article, read_listing};
use crate::error::{BotError, Result};
use crate::keys::{ARROW_LEFT, END, ENTER, PAGE_UP};
use crate::link::Link;
use crate::navigation::{enter_board_by_name, enter_index};
use crate::pager::read_content;
use tracing::{debug, info, warn};

/// Lowest listing id; a page starting here is the last one.
const FIRST_ID: u32 = 1;
/// Rows above the target when jumping to an id, so it lands mid-screen.
const JUMP_MARGIN: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Boardname(String),
    /// Listing id to jump to, or to open with the single-article fetches.
    Id(u32),
    /// Minimum recommendation count, as the host's `Z` search takes it.
    Push(String),
    Author(String),
    Title(String),
}

#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    boardname: String,
    id: u32,
    searches: Vec<(char, String)>,
}

impl ArticleQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter. Naming the board a second time is ignored with a
    /// warning.
    pub fn filter(mut self, filter: Filter) -> Self {
        match filter {
            Filter::Boardname(name) => {
                if self.boardname.is_empty() {
                    self.boardname = name;
                } else {
                    warn!(current = %self.boardname, ignored = %name, "board already set on query");
                }
            }
            Filter::Id(id) => self.id = id,
            Filter::Push(value) => self.searches.push(('Z', value)),
            Filter::Author(value) => self.searches.push(('a', value)),
            Filter::Title(value) => self.searches.push(('/', value)),
        }
        self
    }

    pub fn boardname(&self) -> &str {
        &self.boardname
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// The search keystrokes for this query's filters.
    pub fn query(&self) -> String {
        self.searches
            .iter()
            .map(|(op, value)| format!("{op}{value}{ENTER}"))
            .collect()
    }

    /// Enter the board and type the search. Returns whether the host redrew.
    async fn open<L: Link + ?Sized>(&self, link: &mut L) -> Result<bool> {
        enter_board_by_name(link, &self.boardname).await?;
        let found = link.send(&self.query()).await?;
        debug!(boardname = %self.boardname, found, "query sent");
        Ok(found)
    }

    /// The listing page around the target id, oldest first.
    ///
    /// Rows without an id (pinned articles) are numbered on from their
    /// neighbours. Returns an empty list when the search finds nothing.
    pub async fn get<L: Link + ?Sized>(&self, link: &mut L) -> Result<Vec<Article>> {
        if !self.open(link).await? {
            return Ok(Vec::new());
        }
        if self.id > 0 {
            let target = self.id.saturating_sub(JUMP_MARGIN).max(FIRST_ID);
            link.send(&format!("{END}{END}{target}{ENTER}")).await?;
        }
        let mut articles = read_listing(link.screen(), &self.boardname);
        renumber(&mut articles);
        enter_index(link).await?;
        articles.reverse();
        info!(boardname = %self.boardname, count = articles.len(), "listing read");
        Ok(articles)
    }

    /// Open listing entry `id` of the search result and read it. Returns to
    /// the index afterwards.
    pub async fn get_one<L: Link + ?Sized>(&self, link: &mut L) -> Result<Article> {
        if !self.open(link).await? {
            enter_index(link).await?;
            return Err(BotError::SearchFailed(self.boardname.clone()));
        }
        let article = self.read_entry(link).await?;
        enter_index(link).await?;
        Ok(article)
    }

    /// Open listing entry `id` of a search result already on screen and
    /// read it. Steps back to the result list afterwards.
    pub async fn get_one_in_search<L: Link + ?Sized>(&self, link: &mut L) -> Result<Article> {
        let article = self.read_entry(link).await?;
        link.send(ARROW_LEFT).await?;
        Ok(article)
    }

    async fn read_entry<L: Link + ?Sized>(&self, link: &mut L) -> Result<Article> {
        // Listing ids are local to the current view, not global.
        link.send(&format!("{}{ENTER}{ENTER}", self.id)).await?;
        let mut article = Article {
            boardname: self.boardname.clone(),
            id: self.id,
            content: read_content(link).await?,
            ..Article::default()
        };
        article.apply_header();
        Ok(article)
    }

    /// Page through the result from the newest entries backwards.
    pub fn pages<'a, L: Link + ?Sized>(&'a self, link: &'a mut L) -> ArticlePages<'a, L> {
        ArticlePages {
            query: self,
            link,
            top_id: None,
            done: false,
        }
    }
}

/// Fill in ids the listing leaves blank: the first row takes its number
/// from the first numbered row below it and every later row follows on.
fn renumber(articles: &mut [Article]) {
    if articles.len() >= 2 && articles[0].id == 0 {
        let first = articles
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, article)| article.id != 0)
            .map(|(offset, article)| article.id.saturating_sub(offset as u32));
        if let Some(id) = first {
            articles[0].id = id;
        }
    }
    for i in 1..articles.len() {
        articles[i].id = articles[i - 1].id + 1;
    }
}

/// Forward-only cursor over result pages, newest page first.
///
/// Not restartable: once it yields `None` it stays exhausted.
pub struct ArticlePages<'a, L: Link + ?Sized> {
    query: &'a ArticleQuery,
    link: &'a mut L,
    /// Id at the top of the last page yielded.
    top_id: Option<u32>,
    done: bool,
}

impl<L: Link + ?Sized> ArticlePages<'_, L> {
    pub async fn next_page(&mut self) -> Result<Option<Vec<Article>>> {
        if self.done || self.top_id == Some(FIRST_ID) {
            self.done = true;
            return Ok(None);
        }

        if self.top_id.is_none() {
            if !self.query.open(&mut *self.link).await? {
                self.done = true;
                return Ok(None);
            }
            // Start from the bottom so repeated searches see the same pages.
            // Already being there leaves the screen as is.
            if !self.link.send(END).await? {
                debug!("listing already at the bottom");
            }
        } else if !self.link.send(PAGE_UP).await? {
            debug!("page up did not redraw, no more pages");
            self.done = true;
            return Ok(None);
        }

        let articles = read_listing(self.link.screen(), &self.query.boardname);
        let Some(first) = articles.first() else {
            self.done = true;
            return Ok(None);
        };
        if self.top_id == Some(first.id) {
            debug!(top_id = first.id, "listing did not scroll, no more pages");
            self.done = true;
            return Ok(None);
        }
        self.top_id = Some(first.id);
        debug!(top_id = first.id, count = articles.len(), "result page read");
        Ok(Some(articles))
    }
}
