//! Command-line entry point.
//!
//! # Responsibility
//! - Probe core crate wiring (`ping`, `version`).
//! - Push a single request through the handler layer against a real database,
//!   printing the status and the JSON body or page context.

use bytes::Bytes;
use clap::{Parser, Subcommand};
use http::{Method, Request};
use log::error;
use quill_api::{dispatch, ArticleApi, Dispatched, PageResponse};
use quill_core::db::open_pool;
use quill_core::{AppConfig, ArticleService, SqliteArticleRepository, EDIT_TOKEN_HEADER};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "quill", version, about = "Quill blog backend CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print `pong` from the core crate.
    Ping,
    /// Print the core crate version.
    Version,
    /// Dispatch one request, e.g. `quill request POST /api/articles --body '{"Title":"A","Body":"B"}'`.
    Request(RequestArgs),
}

#[derive(Parser)]
struct RequestArgs {
    /// HTTP method.
    method: Method,
    /// Request path, optionally with a query string.
    path: String,
    #[arg(long, default_value = "")]
    body: String,
    #[arg(long, default_value = "application/json")]
    content_type: String,
    #[arg(long)]
    referer: Option<String>,
    #[arg(long)]
    edit_token: Option<String>,
    /// Overrides `QUILL_DB_PATH`.
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Ping => {
            println!("quill_core ping={}", quill_core::ping());
            ExitCode::SUCCESS
        }
        Command::Version => {
            println!("quill_core version={}", quill_core::core_version());
            ExitCode::SUCCESS
        }
        Command::Request(args) => match run_request(args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                eprintln!("quill: {message}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run_request(args: RequestArgs) -> Result<(), String> {
    let config = AppConfig::from_env();
    quill_core::init_logging(&config.log_level, config.log_dir.as_deref())
        .map_err(|err| format!("logging init failed: {err}"))?;

    let db_path = args.db.clone().unwrap_or_else(|| config.db_path.clone());
    let pool = open_pool(&db_path).map_err(|err| {
        error!(
            "event=cli_request module=cli status=error db_path={} error={}",
            db_path.display(),
            err
        );
        format!("cannot open {}: {err}", db_path.display())
    })?;
    let repo = SqliteArticleRepository::try_new(pool).map_err(|err| err.to_string())?;
    let api = ArticleApi::new(ArticleService::new(repo), config.edit_guard());

    let request = build_request(&args).map_err(|err| format!("invalid request: {err}"))?;
    let dispatched = dispatch(&api, &request);

    println!("{}", dispatched.status());
    match dispatched {
        Dispatched::Api(response) => {
            println!("{}", String::from_utf8_lossy(response.body()));
        }
        Dispatched::Page(PageResponse::Render(view)) => {
            let context = serde_json::to_string_pretty(&view.context)
                .map_err(|err| format!("cannot print page context: {err}"))?;
            println!("template={}", view.template);
            println!("{context}");
        }
        Dispatched::Page(PageResponse::Redirect { location, .. }) => {
            println!("location={location}");
        }
        Dispatched::Page(PageResponse::Error(_)) => {}
    }
    Ok(())
}

fn build_request(args: &RequestArgs) -> Result<Request<Bytes>, http::Error> {
    let mut builder = Request::builder()
        .method(args.method.clone())
        .uri(args.path.as_str())
        .header(http::header::CONTENT_TYPE, args.content_type.as_str());
    if let Some(referer) = &args.referer {
        builder = builder.header(http::header::REFERER, referer.as_str());
    }
    if let Some(token) = &args.edit_token {
        builder = builder.header(EDIT_TOKEN_HEADER, token.as_str());
    }
    builder.body(Bytes::from(args.body.clone()))
}
