//! Same-resource check for article edits.
//!
//! # Responsibility
//! - Decide whether an update request targets the article whose edit form
//!   produced it.
//! - Issue per-article edit tokens when running in token mode.
//!
//! # Invariants
//! - Verification never panics on missing or malformed input; every such case
//!   is a rejection.
//! - This is an anti-cross-resource-edit heuristic, not authentication.

use crate::model::article::ArticleId;
use sha2::{Digest, Sha256};
use std::fmt::{Debug, Formatter};
use thiserror::Error;
use url::Url;

/// Header carrying the edit token in token mode.
pub const EDIT_TOKEN_HEADER: &str = "x-edit-token";

const ARTICLES_SEGMENT: &str = "articles";

/// Client-supplied evidence about where an update came from.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditCredentials<'a> {
    /// Raw `Referer` header value.
    pub referer: Option<&'a str>,
    /// Raw `X-Edit-Token` header value.
    pub edit_token: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditGuardError {
    #[error("referer header is missing")]
    MissingReferer,
    #[error("referer `{0}` does not point at an article")]
    MalformedReferer(String),
    #[error("referer targets article {found}, request targets article {expected}")]
    RefererMismatch {
        expected: ArticleId,
        found: ArticleId,
    },
    #[error("edit token header is missing")]
    MissingToken,
    #[error("edit token does not match article {0}")]
    TokenMismatch(ArticleId),
}

/// Strategy for the same-resource check on updates.
#[derive(Clone, Default)]
pub enum EditGuard {
    /// The article id embedded in `Referer` (`.../articles/{id}/edit`) must
    /// equal the requested id.
    #[default]
    Referer,
    /// The request must echo the token issued with the edit form.
    Token { secret: Vec<u8> },
}

impl Debug for EditGuard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Referer => f.write_str("EditGuard::Referer"),
            Self::Token { .. } => f.write_str("EditGuard::Token { secret: <redacted> }"),
        }
    }
}

impl EditGuard {
    /// Token mode when a non-empty secret is configured, referer mode otherwise.
    pub fn from_secret(secret: Option<&str>) -> Self {
        match secret.map(str::trim) {
            Some(value) if !value.is_empty() => Self::Token {
                secret: value.as_bytes().to_vec(),
            },
            _ => Self::Referer,
        }
    }

    /// Token to embed in the edit form for `id`; `None` in referer mode.
    pub fn issue_token(&self, id: ArticleId) -> Option<String> {
        match self {
            Self::Referer => None,
            Self::Token { secret } => Some(edit_token(secret, id)),
        }
    }

    /// Checks that an update of `id` comes from that article's edit form.
    pub fn verify(
        &self,
        id: ArticleId,
        credentials: &EditCredentials<'_>,
    ) -> Result<(), EditGuardError> {
        match self {
            Self::Referer => {
                let referer = credentials.referer.ok_or(EditGuardError::MissingReferer)?;
                let found = referer_article_id(referer)?;
                if found != id {
                    return Err(EditGuardError::RefererMismatch { expected: id, found });
                }
                Ok(())
            }
            Self::Token { secret } => {
                let presented = credentials.edit_token.ok_or(EditGuardError::MissingToken)?;
                let expected = edit_token(secret, id);
                if !constant_time_eq(presented.trim().as_bytes(), expected.as_bytes()) {
                    return Err(EditGuardError::TokenMismatch(id));
                }
                Ok(())
            }
        }
    }
}

/// Extracts the article id from an edit page URL such as
/// `https://blog.example/articles/42/edit`.
pub fn referer_article_id(referer: &str) -> Result<ArticleId, EditGuardError> {
    let malformed = || EditGuardError::MalformedReferer(referer.to_string());
    let url = Url::parse(referer.trim()).map_err(|_| malformed())?;
    let segments: Vec<&str> = url.path_segments().ok_or_else(malformed)?.collect();

    segments
        .windows(2)
        .find(|pair| pair[0] == ARTICLES_SEGMENT)
        .and_then(|pair| pair[1].parse::<ArticleId>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(malformed)
}

fn edit_token(secret: &[u8], id: ArticleId) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.update(b":");
    hasher.update(id.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (l, r)| acc | (l ^ r))
        == 0
}
