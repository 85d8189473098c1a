//! Route table and request dispatch.
//!
//! The HTTP server itself lives outside this crate. It hands each request to
//! [`dispatch`] and writes back the API response or renders the page.

use crate::api::{empty_response, ArticleApi, RequestContext};
use crate::pages::PageResponse;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, REFERER};
use http::{HeaderMap, Method, Request, Response, StatusCode};
use log::{error, info};
use once_cell::sync::Lazy;
use quill_core::{ArticleRepository, EditCredentials, EDIT_TOKEN_HEADER};
use std::time::Instant;

/// Path templates known to the router; the method is resolved afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Index,
    NewArticle,
    ShowArticle,
    EditArticle,
    ArticleCollection,
    ArticleMember,
}

const ROUTE_TABLE: &[(&str, Endpoint)] = &[
    ("/", Endpoint::Index),
    ("/articles", Endpoint::Index),
    ("/articles/new", Endpoint::NewArticle),
    ("/articles/{id}", Endpoint::ShowArticle),
    ("/articles/{id}/edit", Endpoint::EditArticle),
    ("/api/articles", Endpoint::ArticleCollection),
    ("/api/articles/{id}", Endpoint::ArticleMember),
];

static PATH_ROUTER: Lazy<Result<matchit::Router<Endpoint>, matchit::InsertError>> =
    Lazy::new(build_router);

fn build_router() -> Result<matchit::Router<Endpoint>, matchit::InsertError> {
    let mut router = matchit::Router::new();
    for &(path, endpoint) in ROUTE_TABLE {
        router.insert(path, endpoint)?;
    }
    Ok(router)
}

/// Matched endpoint with its raw path parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    IndexPage,
    NewPage,
    ShowPage(&'a str),
    EditPage(&'a str),
    ListArticles,
    CreateArticle,
    DeleteArticle(&'a str),
    UpdateArticle(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch<'a> {
    Found(Route<'a>),
    MethodNotAllowed,
    NotFound,
}

/// Outcome of dispatching one request.
#[derive(Debug)]
pub enum Dispatched {
    Api(Response<Bytes>),
    Page(PageResponse),
}

impl Dispatched {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Api(response) => response.status(),
            Self::Page(PageResponse::Render(_)) => StatusCode::OK,
            Self::Page(PageResponse::Redirect { status, .. }) => *status,
            Self::Page(PageResponse::Error(status)) => *status,
        }
    }
}

/// Resolves `(method, path)` against the route table.
pub fn match_route<'a>(method: &Method, path: &'a str) -> RouteMatch<'a> {
    let router = match &*PATH_ROUTER {
        Ok(router) => router,
        Err(err) => {
            error!("event=route_table module=router status=error error={err}");
            return RouteMatch::NotFound;
        }
    };
    let Ok(matched) = router.at(path) else {
        return RouteMatch::NotFound;
    };
    let id = matched.params.get("id").unwrap_or_default();
    let is = |allowed: Method| *method == allowed;

    let route = match *matched.value {
        Endpoint::Index if is(Method::GET) => Some(Route::IndexPage),
        Endpoint::NewArticle if is(Method::GET) => Some(Route::NewPage),
        Endpoint::ShowArticle if is(Method::GET) => Some(Route::ShowPage(id)),
        Endpoint::EditArticle if is(Method::GET) => Some(Route::EditPage(id)),
        Endpoint::ArticleCollection if is(Method::GET) => Some(Route::ListArticles),
        Endpoint::ArticleCollection if is(Method::POST) => Some(Route::CreateArticle),
        Endpoint::ArticleMember if is(Method::DELETE) => Some(Route::DeleteArticle(id)),
        Endpoint::ArticleMember if is(Method::PATCH) => Some(Route::UpdateArticle(id)),
        _ => None,
    };
    route.map_or(RouteMatch::MethodNotAllowed, RouteMatch::Found)
}

/// Routes one request to its handler.
///
/// Emits one `http_request` event per request with status and duration.
pub fn dispatch<R: ArticleRepository>(api: &ArticleApi<R>, request: &Request<Bytes>) -> Dispatched {
    let started_at = Instant::now();
    let ctx = RequestContext::new();
    let method = request.method();
    let path = request.uri().path();
    let headers = request.headers();
    let body = request.body().as_ref();

    let dispatched = match match_route(method, path) {
        RouteMatch::Found(route) => match route {
            Route::IndexPage => Dispatched::Page(api.index_page(&ctx, path)),
            Route::NewPage => Dispatched::Page(api.new_page()),
            Route::ShowPage(id) => Dispatched::Page(api.show_page(&ctx, id)),
            Route::EditPage(id) => Dispatched::Page(api.edit_page(&ctx, id)),
            Route::ListArticles => Dispatched::Api(api.list_articles(&ctx, request.uri().query())),
            Route::CreateArticle => Dispatched::Api(api.create_article(
                &ctx,
                header_str(headers, CONTENT_TYPE.as_str()),
                body,
            )),
            Route::DeleteArticle(id) => Dispatched::Api(api.delete_article(&ctx, id)),
            Route::UpdateArticle(id) => {
                let credentials = EditCredentials {
                    referer: header_str(headers, REFERER.as_str()),
                    edit_token: header_str(headers, EDIT_TOKEN_HEADER),
                };
                Dispatched::Api(api.update_article(
                    &ctx,
                    id,
                    &credentials,
                    header_str(headers, CONTENT_TYPE.as_str()),
                    body,
                ))
            }
        },
        RouteMatch::MethodNotAllowed => {
            Dispatched::Api(empty_response(StatusCode::METHOD_NOT_ALLOWED))
        }
        RouteMatch::NotFound => Dispatched::Api(empty_response(StatusCode::NOT_FOUND)),
    };

    info!(
        "event=http_request module=router request_id={} method={} path={} http_status={} duration_ms={}",
        ctx.request_id,
        method,
        path,
        dispatched.status().as_u16(),
        started_at.elapsed().as_millis()
    );
    dispatched
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
