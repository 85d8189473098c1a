//! Article use-case service.
//!
//! # Responsibility
//! - Provide validated create/update and plain get/delete/list entry points.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Validation runs before any repository call; invalid drafts persist nothing.
//! - Service layer remains storage-agnostic.
//! - No retries: one repository failure is one service failure.

use crate::model::article::{Article, ArticleDraft, ArticleId, ArticleValidationErrors};
use crate::model::cursor::Cursor;
use crate::repo::article_repo::{ArticleRepository, RepoError, RepoResult};
use log::info;
use std::time::Instant;
use thiserror::Error;

/// Service error for article write use-cases.
#[derive(Debug, Error)]
pub enum ArticleServiceError {
    /// Field-level violations; nothing was persisted.
    #[error(transparent)]
    Validation(ArticleValidationErrors),
    /// Persistence-layer failure.
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for ArticleServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(errors) => Self::Validation(errors),
            other => Self::Repo(other),
        }
    }
}

impl From<ArticleValidationErrors> for ArticleServiceError {
    fn from(value: ArticleValidationErrors) -> Self {
        Self::Validation(value)
    }
}

pub type ServiceResult<T> = Result<T, ArticleServiceError>;

/// One listing page plus the cursor for the page after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlePage {
    /// Items sorted by `id DESC`.
    pub items: Vec<Article>,
    /// `None` when `items` is empty.
    pub next_cursor: Option<Cursor>,
}

/// Use-case service wrapper for article CRUD operations.
pub struct ArticleService<R: ArticleRepository> {
    repo: R,
}

impl<R: ArticleRepository> ArticleService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and persists a new article.
    ///
    /// # Contract
    /// - Returns the stored article with `created == updated`.
    pub fn create_article(&self, draft: &ArticleDraft) -> ServiceResult<Article> {
        draft.validate()?;
        let started_at = Instant::now();
        let article = self.repo.create_article(draft)?;
        info!(
            "event=article_create module=service status=ok article_id={} duration_ms={}",
            article.id,
            started_at.elapsed().as_millis()
        );
        Ok(article)
    }

    /// Validates and applies a full title/body replacement.
    ///
    /// # Contract
    /// - `Ok(None)` means no article has `id`; this is not an error.
    pub fn update_article(
        &self,
        id: ArticleId,
        draft: &ArticleDraft,
    ) -> ServiceResult<Option<Article>> {
        draft.validate()?;
        let started_at = Instant::now();
        let updated = self.repo.update_article(id, draft)?;
        info!(
            "event=article_update module=service status=ok article_id={} matched={} duration_ms={}",
            id,
            updated.is_some(),
            started_at.elapsed().as_millis()
        );
        Ok(updated)
    }

    /// Gets one article by id; absent ids surface as `RepoError::NotFound`.
    pub fn get_article(&self, id: ArticleId) -> RepoResult<Article> {
        self.repo.get_article(id)
    }

    /// Deletes one article. Deleting an absent id succeeds.
    pub fn delete_article(&self, id: ArticleId) -> RepoResult<()> {
        self.repo.delete_article(id)?;
        info!("event=article_delete module=service status=ok article_id={id}");
        Ok(())
    }

    /// Lists one newest-first page below `cursor`.
    pub fn list_articles(&self, cursor: Cursor) -> RepoResult<ArticlePage> {
        let items = self.repo.list_articles(cursor)?;
        let next_cursor = Cursor::after_page(&items);
        Ok(ArticlePage { items, next_cursor })
    }
}
