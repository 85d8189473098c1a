//! Server-rendered page flows.
//!
//! Template rendering happens outside this crate; handlers return the
//! template name plus its context, a redirect, or an error status.

use crate::api::{log_failure, resolve_article_id, ApiError, ArticleApi, RequestContext};
use chrono::{DateTime, Utc};
use http::StatusCode;
use log::error;
use quill_core::{Article, ArticleId, ArticleRepository, Cursor};
use serde::Serialize;

pub const INDEX_TEMPLATE: &str = "article/index.html";
pub const NEW_TEMPLATE: &str = "article/new.html";
pub const SHOW_TEMPLATE: &str = "article/show.html";
pub const EDIT_TEMPLATE: &str = "article/edit.html";

/// Legacy listing path that permanently redirects to `/`.
pub const LEGACY_INDEX_PATH: &str = "/articles";

/// Template plus the JSON context it is rendered with.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub template: &'static str,
    pub context: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageResponse {
    Render(PageView),
    Redirect {
        status: StatusCode,
        location: &'static str,
    },
    Error(StatusCode),
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct IndexContext<'a> {
    articles: &'a [Article],
    /// Id of the last listed article, `0` when the page is empty.
    cursor: ArticleId,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct NewContext {
    message: &'static str,
    now: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ArticleContext<'a> {
    article: &'a Article,
    #[serde(skip_serializing_if = "Option::is_none")]
    edit_token: Option<String>,
}

impl<R: ArticleRepository> ArticleApi<R> {
    /// `GET /` and `GET /articles`.
    pub fn index_page(&self, ctx: &RequestContext, path: &str) -> PageResponse {
        if path == LEGACY_INDEX_PATH {
            return PageResponse::Redirect {
                status: StatusCode::PERMANENT_REDIRECT,
                location: "/",
            };
        }

        match self.service().list_articles(Cursor::First) {
            Ok(page) => {
                let cursor = page.next_cursor.unwrap_or_default().as_query_value();
                render(
                    INDEX_TEMPLATE,
                    &IndexContext {
                        articles: &page.items,
                        cursor,
                    },
                )
            }
            Err(err) => {
                let err = ApiError::from(err);
                log_failure(ctx, "page_index", &err);
                PageResponse::Error(err.status())
            }
        }
    }

    /// `GET /articles/new`.
    pub fn new_page(&self) -> PageResponse {
        render(
            NEW_TEMPLATE,
            &NewContext {
                message: "Article New",
                now: Utc::now(),
            },
        )
    }

    /// `GET /articles/{id}`.
    pub fn show_page(&self, ctx: &RequestContext, raw_id: &str) -> PageResponse {
        match self.load_article(raw_id) {
            Ok(article) => render(
                SHOW_TEMPLATE,
                &ArticleContext {
                    article: &article,
                    edit_token: None,
                },
            ),
            Err(err) => {
                log_failure(ctx, "page_show", &err);
                PageResponse::Error(err.status())
            }
        }
    }

    /// `GET /articles/{id}/edit`.
    ///
    /// In token mode the context carries the `EditToken` the form must echo.
    pub fn edit_page(&self, ctx: &RequestContext, raw_id: &str) -> PageResponse {
        match self.load_article(raw_id) {
            Ok(article) => render(
                EDIT_TEMPLATE,
                &ArticleContext {
                    edit_token: self.guard().issue_token(article.id),
                    article: &article,
                },
            ),
            Err(err) => {
                log_failure(ctx, "page_edit", &err);
                PageResponse::Error(err.status())
            }
        }
    }

    fn load_article(&self, raw_id: &str) -> Result<Article, ApiError> {
        let id = resolve_article_id(raw_id)?;
        Ok(self.service().get_article(id)?)
    }
}

fn render<T: Serialize>(template: &'static str, context: &T) -> PageResponse {
    match serde_json::to_value(context) {
        Ok(context) => PageResponse::Render(PageView { template, context }),
        Err(err) => {
            error!("event=page_render module=api status=error template={template} error={err}");
            PageResponse::Error(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
