//! Database schema and per-dialect query text

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::utils::{StoreConfig, StoreError};

pub const DOWNLOADS_TABLE: &str = "downloads";
pub const USER_IDS_TABLE: &str = "user_ids";

/// Parameter order of the download insert; `?1..=?8` bind in this order
pub const DOWNLOAD_INSERT_COLUMNS: [&str; 8] = [
    "user_id",
    "downloaded",
    "filter_set",
    "operating_system",
    "architecture",
    "version",
    "binary_name",
    "url",
];

/// Parameter order of the user id insert
pub const USER_ID_INSERT_COLUMNS: [&str; 3] = ["id", "created", "expires"];

/// Columns projected by the recent downloads select, in result order
pub const RECENT_DOWNLOAD_COLUMNS: [&str; 4] =
    ["operating_system", "architecture", "version", "binary_name"];

/// Recent downloads select parameters: `?1` is the row limit
pub const RECENT_LIMIT_PARAM: usize = 1;
/// Recent downloads select parameters: `?2` is the user identifier
pub const RECENT_USER_PARAM: usize = 2;

const SQLITE_CREATE_DOWNLOADS: &str = r#"
    CREATE TABLE IF NOT EXISTS downloads (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        downloaded DATETIME NOT NULL,
        filter_set TEXT NOT NULL,
        operating_system TEXT NOT NULL,
        architecture TEXT NOT NULL,
        version TEXT NOT NULL,
        binary_name TEXT NOT NULL,
        url TEXT NOT NULL,
        FOREIGN KEY (user_id) REFERENCES user_ids(id)
    )
"#;

const SQLITE_CREATE_DOWNLOADS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_downloads_user ON downloads(user_id, downloaded)";

const SQLITE_CREATE_USER_IDS: &str = r#"
    CREATE TABLE IF NOT EXISTS user_ids (
        id TEXT PRIMARY KEY,
        created DATETIME NOT NULL,
        expires DATETIME NOT NULL
    )
"#;

// Duplicate ids are ignored so they surface as a zero row count.
const SQLITE_INSERT_USER_ID: &str = r#"
    INSERT OR IGNORE INTO user_ids (id, created, expires)
    VALUES (?1, ?2, ?3)
"#;

const SQLITE_INSERT_DOWNLOAD: &str = r#"
    INSERT INTO downloads
    (user_id, downloaded, filter_set, operating_system, architecture, version, binary_name, url)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

const SQLITE_SELECT_RECENT_DOWNLOADS: &str = r#"
    SELECT operating_system, architecture, version, binary_name
    FROM downloads
    WHERE user_id = ?2
    ORDER BY downloaded DESC, id DESC
    LIMIT ?1
"#;

/// SQL variant used to pick table and query text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    #[default]
    #[serde(rename = "sqlite3")]
    Sqlite3,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Sqlite3 => "sqlite3",
        }
    }

    /// Statements creating the downloads table and its lookup index
    pub fn create_downloads_table(&self) -> &'static [&'static str] {
        match self {
            Dialect::Sqlite3 => &[SQLITE_CREATE_DOWNLOADS, SQLITE_CREATE_DOWNLOADS_INDEX],
        }
    }

    pub fn create_user_ids_table(&self) -> &'static [&'static str] {
        match self {
            Dialect::Sqlite3 => &[SQLITE_CREATE_USER_IDS],
        }
    }

    pub fn insert_user_id(&self) -> &'static str {
        match self {
            Dialect::Sqlite3 => SQLITE_INSERT_USER_ID,
        }
    }

    pub fn insert_download(&self) -> &'static str {
        match self {
            Dialect::Sqlite3 => SQLITE_INSERT_DOWNLOAD,
        }
    }

    pub fn select_recent_downloads(&self) -> &'static str {
        match self {
            Dialect::Sqlite3 => SQLITE_SELECT_RECENT_DOWNLOADS,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite3" => Ok(Dialect::Sqlite3),
            other => Err(StoreError::UnsupportedDialect(other.to_string())),
        }
    }
}

fn is_in_memory(target: &str) -> bool {
    let target = target
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    target == ":memory:" || target.contains("mode=memory")
}

/// Open a pool for the configured target, creating the database file if missing
pub async fn connect(config: &StoreConfig) -> Result<SqlitePool, StoreError> {
    let target = config.database.as_str();
    let connect_err = |source| StoreError::Connect {
        target: target.to_string(),
        source,
    };

    let options = SqliteConnectOptions::from_str(target)
        .map_err(connect_err)?
        .create_if_missing(true);

    // An in-memory database lives only as long as its connection.
    let pool_options = if is_in_memory(target) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(config.effective_max_connections())
    };

    debug!("Connecting to database: {}", target);
    pool_options.connect_with(options).await.map_err(connect_err)
}

async fn create_table(
    pool: &SqlitePool,
    table: &'static str,
    statements: &[&str],
) -> Result<(), StoreError> {
    for sql in statements {
        sqlx::query(sql)
            .execute(pool)
            .await
            .map_err(|source| StoreError::Schema { table, source })?;
    }
    debug!("Ensured table {} exists", table);
    Ok(())
}

/// Create both tables if absent: downloads first, then user ids
pub async fn create_tables(pool: &SqlitePool, dialect: Dialect) -> Result<(), StoreError> {
    info!("Ensuring {} schema", dialect);
    create_table(pool, DOWNLOADS_TABLE, dialect.create_downloads_table()).await?;
    create_table(pool, USER_IDS_TABLE, dialect.create_user_ids_table()).await?;
    Ok(())
}
