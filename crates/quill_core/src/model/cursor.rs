//! Keyset pagination cursor over article ids.

use crate::model::article::{Article, ArticleId};

/// Page position for newest-first article listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cursor {
    /// No upper bound: the page of highest ids.
    #[default]
    First,
    /// Exclusive upper bound on id.
    Before(ArticleId),
}

impl Cursor {
    /// Resolves a raw `cursor` query value.
    ///
    /// Absent, non-numeric and non-positive values all mean the first page.
    pub fn from_query_value(value: Option<&str>) -> Self {
        match value.and_then(|raw| raw.trim().parse::<ArticleId>().ok()) {
            Some(id) if id > 0 => Self::Before(id),
            _ => Self::First,
        }
    }

    /// Cursor for the page following `page`.
    ///
    /// Returns `None` for an empty page, which marks the end of the listing.
    pub fn after_page(page: &[Article]) -> Option<Self> {
        page.last().map(|article| Self::Before(article.id))
    }

    /// Numeric form used in rendered pages and query strings (`0` = first page).
    pub fn as_query_value(self) -> ArticleId {
        match self {
            Self::First => 0,
            Self::Before(id) => id,
        }
    }
}
