//! Article repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and cursor pagination over the `articles` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `ArticleDraft::validate()` before SQL mutations.
//! - Create stamps `created == updated`; update strictly increases `updated`
//!   and never touches `created`.
//! - Update and delete matching zero rows are not errors.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{DbError, DbPool};
use crate::model::article::{Article, ArticleDraft, ArticleId, ArticleValidationErrors};
use crate::model::cursor::Cursor;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use thiserror::Error;

/// Maximum number of articles returned by one listing page.
pub const ARTICLE_PAGE_SIZE: u32 = 10;

const ARTICLE_SELECT_SQL: &str = "SELECT
    id,
    title,
    body,
    created,
    updated
FROM articles";

const ARTICLE_COLUMNS: &[&str] = &["id", "title", "body", "created", "updated"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for article persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ArticleValidationErrors),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("article not found: {0}")]
    NotFound(ArticleId),
    #[error("invalid persisted article data: {0}")]
    InvalidData(String),
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
    #[error("required column `{table}.{column}` is missing")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<r2d2::Error> for RepoError {
    fn from(value: r2d2::Error) -> Self {
        Self::Db(DbError::Pool(value))
    }
}

/// Repository interface for article CRUD and pagination.
pub trait ArticleRepository {
    /// Inserts a new article and returns it with its assigned id and stamps.
    fn create_article(&self, draft: &ArticleDraft) -> RepoResult<Article>;
    /// Loads one article, failing with `NotFound` when absent.
    fn get_article(&self, id: ArticleId) -> RepoResult<Article>;
    /// Replaces title/body. Returns `None` when no row has `id`.
    fn update_article(&self, id: ArticleId, draft: &ArticleDraft) -> RepoResult<Option<Article>>;
    /// Hard-deletes one article. Absent ids are not an error.
    fn delete_article(&self, id: ArticleId) -> RepoResult<()>;
    /// Lists up to `ARTICLE_PAGE_SIZE` articles below `cursor`, newest id first.
    fn list_articles(&self, cursor: Cursor) -> RepoResult<Vec<Article>>;
}

/// SQLite-backed article repository over a shared connection pool.
#[derive(Clone)]
pub struct SqliteArticleRepository {
    pool: DbPool,
}

impl SqliteArticleRepository {
    /// Constructs a repository from a migrated pool.
    ///
    /// Fails when the `articles` table or one of its columns is missing.
    pub fn try_new(pool: DbPool) -> RepoResult<Self> {
        {
            let conn = pool.get()?;
            ensure_article_table_ready(&conn)?;
        }
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl ArticleRepository for SqliteArticleRepository {
    fn create_article(&self, draft: &ArticleDraft) -> RepoResult<Article> {
        draft.validate()?;
        let stamp = Utc::now().timestamp_micros();

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO articles (title, body, created, updated)
             VALUES (?1, ?2, ?3, ?3);",
            params![draft.title.as_str(), draft.body.as_str(), stamp],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        let stamped = micros_to_datetime(stamp, "created")?;
        Ok(Article {
            id,
            title: draft.title.clone(),
            body: draft.body.clone(),
            created: stamped,
            updated: stamped,
        })
    }

    fn get_article(&self, id: ArticleId) -> RepoResult<Article> {
        let conn = self.pool.get()?;
        let row = conn
            .query_row(
                &format!("{ARTICLE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                ArticleRow::from_row,
            )
            .optional()?;

        row.ok_or(RepoError::NotFound(id))?.into_article()
    }

    fn update_article(&self, id: ArticleId, draft: &ArticleDraft) -> RepoResult<Option<Article>> {
        draft.validate()?;
        let stamp = Utc::now().timestamp_micros();

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        // `max(.., updated + 1)` keeps `updated` strictly increasing even when
        // the wall clock steps backwards.
        let row = tx
            .query_row(
                "UPDATE articles
                 SET
                    title = ?1,
                    body = ?2,
                    updated = max(?3, updated + 1)
                 WHERE id = ?4
                 RETURNING id, title, body, created, updated;",
                params![draft.title.as_str(), draft.body.as_str(), stamp, id],
                ArticleRow::from_row,
            )
            .optional()?;
        tx.commit()?;

        row.map(ArticleRow::into_article).transpose()
    }

    fn delete_article(&self, id: ArticleId) -> RepoResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM articles WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(())
    }

    fn list_articles(&self, cursor: Cursor) -> RepoResult<Vec<Article>> {
        let upper_bound = match cursor {
            Cursor::First => None,
            Cursor::Before(id) => Some(id),
        };

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{ARTICLE_SELECT_SQL}
             WHERE (?1 IS NULL OR id < ?1)
             ORDER BY id DESC
             LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![upper_bound, ARTICLE_PAGE_SIZE])?;

        let mut articles = Vec::with_capacity(ARTICLE_PAGE_SIZE as usize);
        while let Some(row) = rows.next()? {
            articles.push(ArticleRow::from_row(row)?.into_article()?);
        }

        Ok(articles)
    }
}

/// Raw column values as stored, before timestamp decoding.
struct ArticleRow {
    id: ArticleId,
    title: String,
    body: String,
    created: i64,
    updated: i64,
}

impl ArticleRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            body: row.get("body")?,
            created: row.get("created")?,
            updated: row.get("updated")?,
        })
    }

    fn into_article(self) -> RepoResult<Article> {
        let created = micros_to_datetime(self.created, "created")?;
        let updated = micros_to_datetime(self.updated, "updated")?;
        if created > updated {
            return Err(RepoError::InvalidData(format!(
                "article {} has created after updated",
                self.id
            )));
        }

        Ok(Article {
            id: self.id,
            title: self.title,
            body: self.body,
            created,
            updated,
        })
    }
}

fn micros_to_datetime(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    let secs = value.div_euclid(1_000_000);
    let nanos = (value.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{value}` in articles.{column}"
        ))
    })
}

fn ensure_article_table_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, "articles")? {
        return Err(RepoError::MissingRequiredTable("articles"));
    }

    for &column in ARTICLE_COLUMNS {
        if !table_has_column(conn, "articles", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "articles",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
