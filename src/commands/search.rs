//! Listing and search commands.
//!
//! Script syntax:
//! - `list "Board" [id] [filters...]` prints one listing page, oldest first
//! - `search "Board" filters... [pages N]` prints result pages, newest first
//! - `fetch "Board" id [filters...]` prints one article
//!
//! Filters are `author "x"`, `title "x"` and `push "x"`, applied in order.

use crate::article::Article;
use crate::command::{Context, ScriptCommand};
use crate::parser::parse_args;
use crate::search::{ArticleQuery, Filter};
use anyhow::{Context as _, Result, anyhow};
use async_trait::async_trait;

fn parse_filters(words: &[String]) -> Result<Vec<Filter>> {
    let mut filters = Vec::new();
    let mut words = words.iter();
    while let Some(keyword) = words.next() {
        let value = words
            .next()
            .ok_or_else(|| anyhow!("Filter '{}' needs a value", keyword))?
            .clone();
        filters.push(match keyword.as_str() {
            "author" => Filter::Author(value),
            "title" => Filter::Title(value),
            "push" => Filter::Push(value),
            other => return Err(anyhow!("Unknown filter: '{}'", other)),
        });
    }
    Ok(filters)
}

fn build_query(boardname: &str, id: Option<u32>, filters: &[Filter]) -> ArticleQuery {
    let mut query = ArticleQuery::new().filter(Filter::Boardname(boardname.to_string()));
    if let Some(id) = id {
        query = query.filter(Filter::Id(id));
    }
    filters
        .iter()
        .cloned()
        .fold(query, |query, filter| query.filter(filter))
}

fn summary(article: &Article) -> String {
    let id = if article.pinned {
        "★".to_string()
    } else {
        article.id.to_string()
    };
    format!(
        "{:>7} {:<2} {:>5} {:<12} {}",
        id, article.push, article.date, article.author, article.title
    )
}

pub struct List {
    pub boardname: String,
    pub id: Option<u32>,
    pub filters: Vec<Filter>,
}

impl List {
    pub const NAME: &'static str = "list";
}

#[async_trait(?Send)]
impl ScriptCommand for List {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        let words = parse_args(args)?;
        let (boardname, rest) = words
            .split_first()
            .ok_or_else(|| anyhow!("Usage: list \"Board\" [id] [filters...]"))?;
        let (id, rest) = match rest.split_first() {
            Some((first, tail)) if first.parse::<u32>().is_ok() => (first.parse().ok(), tail),
            _ => (None, rest),
        };
        Ok(Self {
            boardname: boardname.clone(),
            id,
            filters: parse_filters(rest)?,
        })
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        let query = build_query(&self.boardname, self.id, &self.filters);
        let articles = query.get(&mut ctx.session).await?;
        for article in &articles {
            ctx.emit_line(&summary(article));
        }
        Ok(())
    }
}

pub struct Search {
    pub boardname: String,
    pub filters: Vec<Filter>,
    /// Stop after this many pages.
    pub pages: Option<usize>,
}

impl Search {
    pub const NAME: &'static str = "search";
}

#[async_trait(?Send)]
impl ScriptCommand for Search {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        let mut words = parse_args(args)?;
        let mut pages = None;
        if words.len() >= 2 && words[words.len() - 2] == "pages" {
            let count = words[words.len() - 1]
                .parse::<usize>()
                .context("Invalid page count")?;
            pages = Some(count);
            words.truncate(words.len() - 2);
        }
        let (boardname, rest) = words
            .split_first()
            .ok_or_else(|| anyhow!("Usage: search \"Board\" filters... [pages N]"))?;
        let filters = parse_filters(rest)?;
        if filters.is_empty() {
            return Err(anyhow!("'search' needs at least one filter"));
        }
        Ok(Self {
            boardname: boardname.clone(),
            filters,
            pages,
        })
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        let query = build_query(&self.boardname, None, &self.filters);
        let mut results = Vec::new();
        {
            let mut pages = query.pages(&mut ctx.session);
            while self.pages.is_none_or(|limit| results.len() < limit) {
                match pages.next_page().await? {
                    Some(page) => results.push(page),
                    None => break,
                }
            }
        }
        for (index, page) in results.iter().enumerate() {
            ctx.emit_line(&format!("-- page {} --", index + 1));
            for article in page {
                ctx.emit_line(&summary(article));
            }
        }
        Ok(())
    }
}

pub struct Fetch {
    pub boardname: String,
    pub id: u32,
    pub filters: Vec<Filter>,
}

impl Fetch {
    pub const NAME: &'static str = "fetch";
}

#[async_trait(?Send)]
impl ScriptCommand for Fetch {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        let words = parse_args(args)?;
        match words.as_slice() {
            [boardname, id, rest @ ..] => Ok(Self {
                boardname: boardname.clone(),
                id: id.parse().context("Invalid listing id")?,
                filters: parse_filters(rest)?,
            }),
            _ => Err(anyhow!("Usage: fetch \"Board\" id [filters...]")),
        }
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        let query = build_query(&self.boardname, Some(self.id), &self.filters);
        let article = query.get_one(&mut ctx.session).await?;
        for row in &article.content {
            ctx.emit_line(row.text());
        }
        Ok(())
    }
}
