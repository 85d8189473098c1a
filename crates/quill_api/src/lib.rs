//! HTTP-facing handler layer for Quill.
//!
//! # Responsibility
//! - Route requests to article handlers.
//! - Decode bodies, enforce the edit guard and map outcomes to status codes.
//!
//! The transport (listener, TLS, templates) is supplied by the embedding
//! server; everything here works on `http::Request<Bytes>` values.

pub mod api;
pub mod body;
pub mod pages;
pub mod router;

pub use api::{parse_article_id, ApiError, ArticleApi, ArticleOutput, RequestContext};
pub use body::{parse_draft, BodyError};
pub use pages::{PageResponse, PageView};
pub use router::{dispatch, match_route, Dispatched, Route, RouteMatch};
