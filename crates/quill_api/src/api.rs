//! JSON API handlers over the article service.
//!
//! # Responsibility
//! - Turn extracted request parts into service calls.
//! - Map outcomes to status codes and the public JSON payloads.
//!
//! # Invariants
//! - Every failure is logged where it is detected.
//! - Response bodies never carry internal error text; only validation
//!   messages reach the client.
//! - Handlers never panic on client input.

use crate::body::{parse_draft, BodyError};
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Response, StatusCode};
use log::{error, warn};
use quill_core::{
    Article, ArticleId, ArticleRepository, ArticleService, ArticleServiceError,
    ArticleValidationErrors, Cursor, EditCredentials, EditGuard, EditGuardError, RepoError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Per-request metadata used to correlate log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: Uuid,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler-level failure taxonomy.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input, bad path id or failed edit guard.
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    ValidationFailed(ArticleValidationErrors),
    /// Path id that can never name a stored article.
    #[error("no article has id `{0}`")]
    UnknownArticle(String),
    /// Not-found and every persistence failure alike.
    #[error(transparent)]
    Store(RepoError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnknownArticle(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BodyError> for ApiError {
    fn from(value: BodyError) -> Self {
        Self::BadRequest(value.to_string())
    }
}

impl From<EditGuardError> for ApiError {
    fn from(value: EditGuardError) -> Self {
        Self::BadRequest(value.to_string())
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(errors) => Self::ValidationFailed(errors),
            other => Self::Store(other),
        }
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(value: ArticleServiceError) -> Self {
        match value {
            ArticleServiceError::Validation(errors) => Self::ValidationFailed(errors),
            ArticleServiceError::Repo(err) => Self::Store(err),
        }
    }
}

/// Response envelope for create and update.
///
/// Serialized as `{Article, Message, ValidationErrors}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ArticleOutput {
    pub article: Option<Article>,
    pub message: String,
    pub validation_errors: Vec<String>,
}

impl ArticleOutput {
    fn saved(article: Article, message: String) -> Self {
        Self {
            article: Some(article),
            message,
            validation_errors: Vec::new(),
        }
    }

    fn failed(err: &ApiError) -> Self {
        match err {
            ApiError::ValidationFailed(errors) => Self {
                validation_errors: errors.messages(),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    cursor: Option<String>,
}

/// Article handlers bound to one service and edit guard.
pub struct ArticleApi<R: ArticleRepository> {
    service: ArticleService<R>,
    guard: EditGuard,
}

impl<R: ArticleRepository> ArticleApi<R> {
    pub fn new(service: ArticleService<R>, guard: EditGuard) -> Self {
        Self { service, guard }
    }

    pub fn service(&self) -> &ArticleService<R> {
        &self.service
    }

    pub fn guard(&self) -> &EditGuard {
        &self.guard
    }

    /// `GET /api/articles?cursor=N`
    ///
    /// Absent, malformed or non-positive cursors list the first page.
    pub fn list_articles(&self, ctx: &RequestContext, query: Option<&str>) -> Response<Bytes> {
        let cursor = Cursor::from_query_value(cursor_param(query).as_deref());
        match self.service.list_articles(cursor) {
            Ok(page) => json_response(StatusCode::OK, &page.items),
            Err(err) => {
                log_failure(ctx, "article_list", &ApiError::from(err));
                json_response(StatusCode::INTERNAL_SERVER_ERROR, "")
            }
        }
    }

    /// `POST /api/articles`
    pub fn create_article(
        &self,
        ctx: &RequestContext,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Response<Bytes> {
        let result = parse_draft(content_type, body)
            .map_err(ApiError::from)
            .and_then(|draft| {
                self.service
                    .create_article(&draft)
                    .map_err(ApiError::from)
            });

        match result {
            Ok(article) => {
                let message = format!("Article {} created.", article.id);
                json_response(StatusCode::OK, &ArticleOutput::saved(article, message))
            }
            Err(err) => {
                log_failure(ctx, "article_create", &err);
                json_response(err.status(), &ArticleOutput::failed(&err))
            }
        }
    }

    /// `PATCH /api/articles/{id}`
    ///
    /// The edit guard runs before the body is read; a guard failure answers
    /// `400` with an empty JSON string.
    pub fn update_article(
        &self,
        ctx: &RequestContext,
        raw_id: &str,
        credentials: &EditCredentials<'_>,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Response<Bytes> {
        let guarded = parse_article_id(raw_id).and_then(|id| {
            self.guard.verify(id, credentials)?;
            Ok(id)
        });
        let id = match guarded {
            Ok(id) => id,
            Err(err) => {
                log_failure(ctx, "article_update", &err);
                return json_response(err.status(), "");
            }
        };

        let result = parse_draft(content_type, body)
            .map_err(ApiError::from)
            .and_then(|draft| {
                self.service
                    .update_article(id, &draft)
                    .map_err(ApiError::from)
            });

        match result {
            Ok(Some(article)) => {
                let message = format!("Article {id} updated.");
                json_response(StatusCode::OK, &ArticleOutput::saved(article, message))
            }
            Ok(None) => {
                warn!(
                    "event=article_update module=api status=noop request_id={} article_id={}",
                    ctx.request_id, id
                );
                let output = ArticleOutput {
                    message: format!("Article {id} does not exist; nothing was updated."),
                    ..ArticleOutput::default()
                };
                json_response(StatusCode::OK, &output)
            }
            Err(err) => {
                log_failure(ctx, "article_update", &err);
                json_response(err.status(), &ArticleOutput::failed(&err))
            }
        }
    }

    /// `DELETE /api/articles/{id}`
    ///
    /// Deleting an absent id reports success; an id that is not a positive
    /// integer fails like a store error.
    pub fn delete_article(&self, ctx: &RequestContext, raw_id: &str) -> Response<Bytes> {
        let result = resolve_article_id(raw_id).and_then(|id| {
            self.service.delete_article(id)?;
            Ok(id)
        });

        match result {
            Ok(id) => json_response(StatusCode::OK, &format!("Article {id} is deleted.")),
            Err(err) => {
                log_failure(ctx, "article_delete", &err);
                json_response(err.status(), "")
            }
        }
    }
}

/// Parses a path id; only positive integers name an article.
pub fn parse_article_id(raw: &str) -> Result<ArticleId, ApiError> {
    match raw.trim().parse::<ArticleId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::BadRequest(format!("invalid article id `{raw}`"))),
    }
}

/// Parses a path id for read and delete flows, where an unusable id is
/// reported the same way as a missing article.
pub(crate) fn resolve_article_id(raw: &str) -> Result<ArticleId, ApiError> {
    parse_article_id(raw).map_err(|_| ApiError::UnknownArticle(raw.to_string()))
}

pub(crate) fn log_failure(ctx: &RequestContext, event: &str, err: &ApiError) {
    let status = err.status();
    if status.is_server_error() {
        error!(
            "event={} module=api status=error request_id={} http_status={} error={}",
            event,
            ctx.request_id,
            status.as_u16(),
            err
        );
    } else {
        warn!(
            "event={} module=api status=rejected request_id={} http_status={} error={}",
            event,
            ctx.request_id,
            status.as_u16(),
            err
        );
    }
}

/// Serializes `value` as the JSON body of a response with `status`.
pub(crate) fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response<Bytes> {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut response = Response::new(Bytes::from(body));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(err) => {
            error!("event=json_encode module=api status=error error={err}");
            empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub(crate) fn empty_response(status: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}

fn cursor_param(query: Option<&str>) -> Option<String> {
    let query = query?;
    serde_html_form::from_str::<ListParams>(query)
        .ok()
        .and_then(|params| params.cursor)
}
