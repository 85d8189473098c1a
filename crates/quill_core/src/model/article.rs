//! Article domain model.
//!
//! # Responsibility
//! - Define the persisted article record and its wire shape.
//! - Define the inbound draft shape and its field validation.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused for another article.
//! - `created <= updated` for every persisted article.
//! - `title` and `body` are never empty once persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-assigned auto-increment identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ArticleId = i64;

/// Persisted article record.
///
/// Serialized as `{ID, Title, Body, Created, Updated}` to match the public
/// JSON contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Article {
    #[serde(rename = "ID")]
    pub id: ArticleId,
    pub title: String,
    pub body: String,
    /// Set once at creation.
    pub created: DateTime<Utc>,
    /// Refreshed on every update; never earlier than `created`.
    pub updated: DateTime<Utc>,
}

/// Inbound article content for create and update requests.
///
/// Missing fields deserialize as empty strings so they are reported by
/// [`ArticleDraft::validate`] instead of failing the parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleDraft {
    #[serde(alias = "Title")]
    pub title: String,
    #[serde(alias = "Body")]
    pub body: String,
}

impl ArticleDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Checks required fields and reports every violation at once.
    pub fn validate(&self) -> Result<(), ArticleValidationErrors> {
        let mut errors = Vec::new();
        if self.title.is_empty() {
            errors.push(ArticleValidationError::MissingTitle);
        }
        if self.body.is_empty() {
            errors.push(ArticleValidationError::MissingBody);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ArticleValidationErrors(errors))
        }
    }
}

/// One field-level constraint violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArticleValidationError {
    #[error("Title is required.")]
    MissingTitle,
    #[error("Body is required.")]
    MissingBody,
}

/// Non-empty list of field violations for one draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid article: {}", join_messages(.0))]
pub struct ArticleValidationErrors(Vec<ArticleValidationError>);

impl ArticleValidationErrors {
    pub fn errors(&self) -> &[ArticleValidationError] {
        &self.0
    }

    /// User-facing messages, one per violation.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

fn join_messages(errors: &[ArticleValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{ArticleDraft, ArticleValidationError};

    #[test]
    fn validate_accepts_filled_draft() {
        assert!(ArticleDraft::new("A", "B").validate().is_ok());
    }

    #[test]
    fn validate_reports_every_missing_field() {
        let err = ArticleDraft::new("", "").validate().unwrap_err();
        assert_eq!(
            err.errors(),
            &[
                ArticleValidationError::MissingTitle,
                ArticleValidationError::MissingBody
            ]
        );
        assert_eq!(err.messages(), vec!["Title is required.", "Body is required."]);
    }

    #[test]
    fn validate_accepts_whitespace_only_content() {
        assert!(ArticleDraft::new(" ", "\n").validate().is_ok());
    }

    #[test]
    fn draft_accepts_lowercase_and_pascal_case_keys() {
        let lower: ArticleDraft = serde_json::from_str(r#"{"title":"t","body":"b"}"#).unwrap();
        let pascal: ArticleDraft = serde_json::from_str(r#"{"Title":"t","Body":"b"}"#).unwrap();
        assert_eq!(lower, pascal);
    }

    #[test]
    fn draft_defaults_missing_fields_to_empty() {
        let draft: ArticleDraft = serde_json::from_str(r#"{"title":"only title"}"#).unwrap();
        assert_eq!(draft.body, "");
        assert!(draft.validate().is_err());
    }
}
