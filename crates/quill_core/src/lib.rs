//! Core domain logic for Quill.
//! This crate is the single source of truth for article invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::AppConfig;
pub use logging::{default_log_level, init_logging, logging_status, LogDestination, LoggingError};
pub use model::article::{
    Article, ArticleDraft, ArticleId, ArticleValidationError, ArticleValidationErrors,
};
pub use model::cursor::Cursor;
pub use repo::article_repo::{
    ArticleRepository, RepoError, RepoResult, SqliteArticleRepository, ARTICLE_PAGE_SIZE,
};
pub use service::article_service::{
    ArticlePage, ArticleService, ArticleServiceError, ServiceResult,
};
pub use service::edit_guard::{EditCredentials, EditGuard, EditGuardError, EDIT_TOKEN_HEADER};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
