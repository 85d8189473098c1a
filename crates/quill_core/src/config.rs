//! Process configuration resolved from environment variables.
//!
//! | variable | default |
//! |---|---|
//! | `QUILL_DB_PATH` | `<temp_dir>/quill.sqlite3` |
//! | `QUILL_LOG_LEVEL` | [`default_log_level`] |
//! | `QUILL_LOG_DIR` | unset (stderr) |
//! | `QUILL_EDIT_SECRET` | unset (referer edit guard) |
//!
//! Empty or whitespace-only values count as unset.

use crate::logging::default_log_level;
use crate::service::edit_guard::EditGuard;
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "QUILL_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "QUILL_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "QUILL_LOG_DIR";
pub const EDIT_SECRET_VAR: &str = "QUILL_EDIT_SECRET";

const DEFAULT_DB_FILE_NAME: &str = "quill.sqlite3";

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub edit_secret: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("db_path", &self.db_path)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .field("edit_secret", &self.edit_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: read(DB_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level: read(LOG_LEVEL_VAR).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read(LOG_DIR_VAR),
            edit_secret: read(EDIT_SECRET_VAR),
        }
    }

    /// Edit guard selected by the configured secret.
    pub fn edit_guard(&self) -> EditGuard {
        EditGuard::from_secret(self.edit_secret.as_deref())
    }
}
