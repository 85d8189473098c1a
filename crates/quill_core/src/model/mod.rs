//! Domain model for the blog backend.
//!
//! # Responsibility
//! - Define the article record and its inbound draft shape.
//! - Define the cursor used for keyset pagination over article ids.
//!
//! # Invariants
//! - Every persisted article is identified by a store-assigned `ArticleId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod article;
pub mod cursor;
