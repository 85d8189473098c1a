use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use quill_api::{dispatch, ArticleApi, ArticleOutput, Dispatched, PageResponse};
use quill_core::db::open_pool_in_memory;
use quill_core::{Article, ArticleService, EditGuard, SqliteArticleRepository};

fn api_with(guard: EditGuard) -> ArticleApi<SqliteArticleRepository> {
    let repo = SqliteArticleRepository::try_new(open_pool_in_memory().unwrap()).unwrap();
    ArticleApi::new(ArticleService::new(repo), guard)
}

fn api() -> ArticleApi<SqliteArticleRepository> {
    api_with(EditGuard::Referer)
}

fn request(method: Method, uri: &str, headers: &[(&str, &str)], body: &str) -> Request<Bytes> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Bytes::from(body.to_owned())).unwrap()
}

fn api_response(dispatched: Dispatched) -> Response<Bytes> {
    match dispatched {
        Dispatched::Api(response) => response,
        Dispatched::Page(page) => panic!("expected API response, got page {page:?}"),
    }
}

fn page_response(dispatched: Dispatched) -> PageResponse {
    match dispatched {
        Dispatched::Page(page) => page,
        Dispatched::Api(response) => panic!("expected page, got {}", response.status()),
    }
}

fn json<T: serde::de::DeserializeOwned>(response: &Response<Bytes>) -> T {
    serde_json::from_slice(response.body()).unwrap()
}

fn create(api: &ArticleApi<SqliteArticleRepository>, title: &str, body: &str) -> Article {
    let payload = serde_json::json!({ "Title": title, "Body": body }).to_string();
    let response = api_response(dispatch(
        api,
        &request(
            Method::POST,
            "/api/articles",
            &[("content-type", "application/json")],
            &payload,
        ),
    ));
    assert_eq!(response.status(), StatusCode::OK);
    json::<ArticleOutput>(&response).article.unwrap()
}

#[test]
fn create_list_rejected_update_delete_scenario() {
    let api = api();

    let response = api_response(dispatch(
        &api,
        &request(
            Method::POST,
            "/api/articles",
            &[("content-type", "application/json")],
            r#"{"Title":"A","Body":"B"}"#,
        ),
    ));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let output: ArticleOutput = json(&response);
    let article = output.article.unwrap();
    assert_eq!(article.id, 1);
    assert_eq!(article.title, "A");
    assert_eq!(article.body, "B");
    assert_eq!(article.created, article.updated);
    assert_eq!(output.message, "Article 1 created.");
    assert!(output.validation_errors.is_empty());

    let response = api_response(dispatch(
        &api,
        &request(Method::GET, "/api/articles?cursor=0", &[], ""),
    ));
    assert_eq!(response.status(), StatusCode::OK);
    let listed: Vec<Article> = json(&response);
    assert_eq!(listed, vec![article.clone()]);

    let response = api_response(dispatch(
        &api,
        &request(
            Method::PATCH,
            "/api/articles/1",
            &[
                ("content-type", "application/json"),
                ("referer", "http://localhost/articles/2/edit"),
            ],
            r#"{"Title":"X","Body":"Y"}"#,
        ),
    ));
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json::<String>(&response), "");
    assert_eq!(api.service().get_article(1).unwrap(), article);

    let response = api_response(dispatch(
        &api,
        &request(Method::DELETE, "/api/articles/1", &[], ""),
    ));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json::<String>(&response), "Article 1 is deleted.");

    let page = page_response(dispatch(
        &api,
        &request(Method::GET, "/articles/1", &[], ""),
    ));
    assert_eq!(
        page,
        PageResponse::Error(StatusCode::INTERNAL_SERVER_ERROR)
    );
}

#[test]
fn update_with_matching_referer_bumps_updated() {
    let api = api();
    let article = create(&api, "A", "B");

    let response = api_response(dispatch(
        &api,
        &request(
            Method::PATCH,
            "/api/articles/1",
            &[
                ("content-type", "application/x-www-form-urlencoded"),
                ("referer", "http://localhost/articles/1/edit"),
            ],
            "title=New+title&body=New+body",
        ),
    ));
    assert_eq!(response.status(), StatusCode::OK);
    let output: ArticleOutput = json(&response);
    let updated = output.article.unwrap();
    assert_eq!(updated.id, article.id);
    assert_eq!(updated.title, "New title");
    assert_eq!(updated.body, "New body");
    assert_eq!(updated.created, article.created);
    assert!(updated.updated > article.updated);
    assert_eq!(output.message, "Article 1 updated.");
}

#[test]
fn update_of_deleted_article_reports_nothing_updated() {
    let api = api();
    create(&api, "A", "B");
    api.service().delete_article(1).unwrap();

    let response = api_response(dispatch(
        &api,
        &request(
            Method::PATCH,
            "/api/articles/1",
            &[("referer", "http://localhost/articles/1/edit")],
            r#"{"Title":"X","Body":"Y"}"#,
        ),
    ));
    assert_eq!(response.status(), StatusCode::OK);
    let output: ArticleOutput = json(&response);
    assert_eq!(output.article, None);
    assert!(output.message.contains("does not exist"));
}

#[test]
fn update_without_referer_is_rejected() {
    let api = api();
    create(&api, "A", "B");

    let response = api_response(dispatch(
        &api,
        &request(
            Method::PATCH,
            "/api/articles/1",
            &[],
            r#"{"Title":"X","Body":"Y"}"#,
        ),
    ));
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn invalid_create_returns_422_with_messages() {
    let api = api();

    let response = api_response(dispatch(
        &api,
        &request(
            Method::POST,
            "/api/articles",
            &[("content-type", "application/json")],
            r#"{"Title":"","Body":""}"#,
        ),
    ));
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let output: ArticleOutput = json(&response);
    assert_eq!(output.article, None);
    assert!(output.message.is_empty());
    assert_eq!(
        output.validation_errors,
        vec!["Title is required.", "Body is required."]
    );

    let listed: Vec<Article> = json(&api_response(dispatch(
        &api,
        &request(Method::GET, "/api/articles", &[], ""),
    )));
    assert!(listed.is_empty());
}

#[test]
fn whitespace_only_fields_are_accepted() {
    let api = api();
    let response = api_response(dispatch(
        &api,
        &request(
            Method::POST,
            "/api/articles",
            &[("content-type", "application/json")],
            r#"{"Title":" ","Body":"x"}"#,
        ),
    ));
    assert_eq!(response.status(), StatusCode::OK);
    let output: ArticleOutput = json(&response);
    assert_eq!(output.article.unwrap().title, " ");
}

#[test]
fn malformed_body_returns_400() {
    let api = api();

    let response = api_response(dispatch(
        &api,
        &request(
            Method::POST,
            "/api/articles",
            &[("content-type", "application/json")],
            "{not json",
        ),
    ));
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let output: ArticleOutput = json(&response);
    assert_eq!(output, ArticleOutput::default());
}

#[test]
fn unusable_path_ids_fail_like_missing_articles() {
    let api = api();
    create(&api, "A", "B");

    for uri in ["/api/articles/abc", "/api/articles/0", "/api/articles/-4"] {
        let response = api_response(dispatch(&api, &request(Method::DELETE, uri, &[], "")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(json::<String>(&response), "", "{uri}");
    }
    for uri in ["/articles/abc", "/articles/0/edit"] {
        let page = page_response(dispatch(&api, &request(Method::GET, uri, &[], "")));
        assert_eq!(page, PageResponse::Error(StatusCode::INTERNAL_SERVER_ERROR), "{uri}");
    }
    assert_eq!(api.service().list_articles(quill_core::Cursor::First).unwrap().items.len(), 1);
}

#[test]
fn update_with_unusable_path_id_is_a_bad_request() {
    let api = api();
    let response = api_response(dispatch(
        &api,
        &request(
            Method::PATCH,
            "/api/articles/abc",
            &[("referer", "http://localhost/articles/abc/edit")],
            r#"{"Title":"X","Body":"Y"}"#,
        ),
    ));
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json::<String>(&response), "");
}

#[test]
fn store_failures_return_500_without_error_text() {
    let repo = SqliteArticleRepository::try_new(open_pool_in_memory().unwrap()).unwrap();
    let pool = repo.pool().clone();
    let api = ArticleApi::new(ArticleService::new(repo), EditGuard::Referer);
    create(&api, "A", "B");
    pool.get()
        .unwrap()
        .execute_batch("DROP TABLE articles;")
        .unwrap();

    let list = api_response(dispatch(
        &api,
        &request(Method::GET, "/api/articles", &[], ""),
    ));
    assert_eq!(list.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json::<String>(&list), "");

    let created = api_response(dispatch(
        &api,
        &request(
            Method::POST,
            "/api/articles",
            &[("content-type", "application/json")],
            r#"{"Title":"A","Body":"B"}"#,
        ),
    ));
    assert_eq!(created.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json::<ArticleOutput>(&created), ArticleOutput::default());

    let updated = api_response(dispatch(
        &api,
        &request(
            Method::PATCH,
            "/api/articles/1",
            &[("referer", "http://localhost/articles/1/edit")],
            r#"{"Title":"X","Body":"Y"}"#,
        ),
    ));
    assert_eq!(updated.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json::<ArticleOutput>(&updated), ArticleOutput::default());

    let deleted = api_response(dispatch(
        &api,
        &request(Method::DELETE, "/api/articles/1", &[], ""),
    ));
    assert_eq!(deleted.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json::<String>(&deleted), "");

    for dispatched in [
        dispatch(&api, &request(Method::GET, "/", &[], "")),
        dispatch(&api, &request(Method::GET, "/articles/1", &[], "")),
    ] {
        assert_eq!(
            page_response(dispatched),
            PageResponse::Error(StatusCode::INTERNAL_SERVER_ERROR)
        );
    }
}

#[test]
fn list_pages_newest_first_with_cursor() {
    let api = api();
    for n in 1..=12 {
        create(&api, &format!("title {n}"), "body");
    }

    let first: Vec<Article> = json(&api_response(dispatch(
        &api,
        &request(Method::GET, "/api/articles", &[], ""),
    )));
    let ids: Vec<i64> = first.iter().map(|a| a.id).collect();
    assert_eq!(ids, (3..=12).rev().collect::<Vec<_>>());

    let second: Vec<Article> = json(&api_response(dispatch(
        &api,
        &request(Method::GET, "/api/articles?cursor=3", &[], ""),
    )));
    let ids: Vec<i64> = second.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![2, 1]);

    let garbage: Vec<Article> = json(&api_response(dispatch(
        &api,
        &request(Method::GET, "/api/articles?cursor=oops", &[], ""),
    )));
    assert_eq!(garbage, first);
}

#[test]
fn token_mode_requires_the_issued_token() {
    let guard = EditGuard::from_secret(Some("s3cret"));
    let api = api_with(guard.clone());
    create(&api, "A", "B");

    let edit = page_response(dispatch(
        &api,
        &request(Method::GET, "/articles/1/edit", &[], ""),
    ));
    let token = match edit {
        PageResponse::Render(view) => {
            assert_eq!(view.template, quill_api::pages::EDIT_TEMPLATE);
            view.context["EditToken"].as_str().unwrap().to_owned()
        }
        other => panic!("unexpected page {other:?}"),
    };
    assert_eq!(Some(token.clone()), guard.issue_token(1));

    let rejected = api_response(dispatch(
        &api,
        &request(
            Method::PATCH,
            "/api/articles/1",
            &[
                ("referer", "http://localhost/articles/1/edit"),
                ("x-edit-token", "forged"),
            ],
            r#"{"Title":"X","Body":"Y"}"#,
        ),
    ));
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let accepted = api_response(dispatch(
        &api,
        &request(
            Method::PATCH,
            "/api/articles/1",
            &[("x-edit-token", token.as_str())],
            r#"{"Title":"X","Body":"Y"}"#,
        ),
    ));
    assert_eq!(accepted.status(), StatusCode::OK);
    let output: ArticleOutput = json(&accepted);
    assert_eq!(output.article.unwrap().title, "X");
}

#[test]
fn pages_render_their_templates() {
    let api = api();
    let article = create(&api, "A", "B");

    match page_response(dispatch(&api, &request(Method::GET, "/", &[], ""))) {
        PageResponse::Render(view) => {
            assert_eq!(view.template, quill_api::pages::INDEX_TEMPLATE);
            assert_eq!(view.context["Cursor"], 1);
            assert_eq!(view.context["Articles"][0]["ID"], 1);
        }
        other => panic!("unexpected page {other:?}"),
    }

    match page_response(dispatch(&api, &request(Method::GET, "/articles/1", &[], ""))) {
        PageResponse::Render(view) => {
            assert_eq!(view.template, quill_api::pages::SHOW_TEMPLATE);
            assert_eq!(view.context["Article"]["Title"], article.title);
            assert!(view.context.get("EditToken").is_none());
        }
        other => panic!("unexpected page {other:?}"),
    }

    match page_response(dispatch(&api, &request(Method::GET, "/articles/new", &[], ""))) {
        PageResponse::Render(view) => {
            assert_eq!(view.template, quill_api::pages::NEW_TEMPLATE);
            assert_eq!(view.context["Message"], "Article New");
            assert!(view.context["Now"].is_string());
        }
        other => panic!("unexpected page {other:?}"),
    }
}

#[test]
fn empty_index_uses_zero_cursor() {
    let api = api();
    match page_response(dispatch(&api, &request(Method::GET, "/", &[], ""))) {
        PageResponse::Render(view) => {
            assert_eq!(view.context["Cursor"], 0);
            assert_eq!(view.context["Articles"], serde_json::json!([]));
        }
        other => panic!("unexpected page {other:?}"),
    }
}

#[test]
fn legacy_listing_path_redirects_permanently() {
    let api = api();
    let page = page_response(dispatch(
        &api,
        &request(Method::GET, "/articles", &[], ""),
    ));
    assert_eq!(
        page,
        PageResponse::Redirect {
            status: StatusCode::PERMANENT_REDIRECT,
            location: "/",
        }
    );
}

#[test]
fn unknown_routes_and_methods_map_to_404_and_405() {
    let api = api();

    let missing = api_response(dispatch(&api, &request(Method::GET, "/nope", &[], "")));
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert!(missing.body().is_empty());

    let wrong_method = api_response(dispatch(
        &api,
        &request(Method::PUT, "/api/articles/1", &[], ""),
    ));
    assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);
}
