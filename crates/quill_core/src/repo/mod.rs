//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the article data access contract.
//! - Isolate SQLite query details from service/handler orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `ArticleDraft::validate()` before persistence.
//! - Every mutation runs in its own short-lived transaction.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod article_repo;
