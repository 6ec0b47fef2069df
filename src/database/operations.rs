//! Download record store operations

use futures::TryStreamExt;
use sqlx::sqlite::{SqlitePool, SqliteRow, SqliteStatement};
use sqlx::{Executor, Row, Statement};
use tracing::{debug, info, warn};

use super::models::{Download, UserId};
use super::schema::{self, Dialect, RECENT_DOWNLOAD_COLUMNS};
use crate::utils::{StoreConfig, StoreError};

/// Durable storage for user ids and their downloads
///
/// Owns the pool and the three statements prepared against it at open time.
/// No statement handle leaves the store.
pub struct RecordStore {
    // Field order is drop order: statements go before the pool.
    insert_user_id: SqliteStatement<'static>,
    insert_download: SqliteStatement<'static>,
    recent_downloads: SqliteStatement<'static>,
    pool: SqlitePool,
    dialect: Dialect,
}

impl RecordStore {
    /// Open the store at `target` with default settings
    pub async fn open(target: &str) -> Result<Self, StoreError> {
        Self::open_with(&StoreConfig::for_target(target)).await
    }

    /// Connect, ensure the schema and prepare statements
    ///
    /// Any failure aborts the whole open; no partially built store is returned.
    pub async fn open_with(config: &StoreConfig) -> Result<Self, StoreError> {
        let dialect = config.dialect;
        let pool = schema::connect(config).await?;
        schema::create_tables(&pool, dialect).await?;

        let insert_user_id = prepare(&pool, "user id insert", dialect.insert_user_id()).await?;
        let insert_download = prepare(&pool, "download insert", dialect.insert_download()).await?;
        let recent_downloads = prepare(
            &pool,
            "recent downloads select",
            dialect.select_recent_downloads(),
        )
        .await?;

        info!("Opened download record store at {}", config.database);
        Ok(Self {
            insert_user_id,
            insert_download,
            recent_downloads,
            pool,
            dialect,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Append one download row
    ///
    /// Fields are stored as given; nothing is validated here.
    pub async fn save_download(&self, download: &Download) -> Result<(), StoreError> {
        // Bind order must match DOWNLOAD_INSERT_COLUMNS.
        self.insert_download
            .query()
            .bind(&download.user)
            .bind(download.downloaded)
            .bind(&download.filter_set)
            .bind(&download.operating_system)
            .bind(&download.architecture)
            .bind(&download.version)
            .bind(&download.binary)
            .bind(&download.url)
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::Execute {
                operation: "save_download",
                source,
            })?;

        debug!(
            "Saved download of {} {} for user {}",
            download.binary, download.version, download.user
        );
        Ok(())
    }

    /// Insert a user id; exactly one row must be affected
    pub async fn save_user_id(&self, user_id: &UserId) -> Result<(), StoreError> {
        let result = self
            .insert_user_id
            .query()
            .bind(&user_id.id)
            .bind(user_id.created)
            .bind(user_id.expires)
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::Execute {
                operation: "save_user_id",
                source,
            })?;

        let affected = result.rows_affected();
        if affected != 1 {
            warn!("Saving user id {} affected {} rows", user_id.id, affected);
            return Err(StoreError::RowsAffected {
                operation: "save_user_id",
                actual: affected,
            });
        }

        debug!("Saved user id: {}", user_id.id);
        Ok(())
    }

    /// Most recent downloads for a user, at most `limit` of them
    ///
    /// Only operating system, architecture, version and binary are read back;
    /// every other field is left at its default.
    pub async fn get_recent_downloads(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Download>, StoreError> {
        // Bound as ?1 = limit, ?2 = user id.
        let mut rows = self
            .recent_downloads
            .query()
            .bind(i64::from(limit))
            .bind(&user_id.id)
            .fetch(&self.pool);

        let mut downloads = Vec::new();
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|source| stream_error(downloads.is_empty(), source))?
        {
            downloads.push(row_into_summary(&row)?);
        }

        debug!(
            "Loaded {} recent downloads for user {}",
            downloads.len(),
            user_id.id
        );
        Ok(downloads)
    }

    /// Release the prepared statements, then close the pool
    pub async fn close(self) {
        let Self {
            insert_user_id,
            insert_download,
            recent_downloads,
            pool,
            ..
        } = self;
        drop(insert_user_id);
        drop(insert_download);
        drop(recent_downloads);

        pool.close().await;
        info!("Closed download record store");
    }
}

async fn prepare(
    pool: &SqlitePool,
    statement: &'static str,
    sql: &'static str,
) -> Result<SqliteStatement<'static>, StoreError> {
    pool.prepare(sql)
        .await
        .map_err(|source| StoreError::Prepare { statement, source })
}

/// Errors before the first row mean the query itself failed; later ones come from the cursor
fn stream_error(before_first_row: bool, source: sqlx::Error) -> StoreError {
    let operation = "get_recent_downloads";
    if before_first_row {
        StoreError::Execute { operation, source }
    } else {
        StoreError::Cursor { operation, source }
    }
}

/// Convert a recent downloads row into a partially filled download
fn row_into_summary(row: &SqliteRow) -> Result<Download, StoreError> {
    let column = |index: usize| {
        row.try_get::<String, _>(index)
            .map_err(|source| StoreError::Scan {
                column: RECENT_DOWNLOAD_COLUMNS[index],
                source,
            })
    };

    Ok(Download {
        operating_system: column(0)?,
        architecture: column(1)?,
        version: column(2)?,
        binary: column(3)?,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn download_for(user: &UserId, binary: &str) -> Download {
        Download {
            user: user.id.clone(),
            downloaded: Utc::now(),
            filter_set: "os=linux".to_string(),
            operating_system: "linux".to_string(),
            architecture: "amd64".to_string(),
            version: "1.28.0".to_string(),
            binary: binary.to_string(),
            url: format!("https://example/{}", binary),
        }
    }

    #[tokio::test]
    async fn test_in_memory_store_round_trip() {
        let store = RecordStore::open(":memory:").await.unwrap();
        assert_eq!(store.dialect(), Dialect::Sqlite3);

        let user = UserId::new(Duration::days(1));
        store.save_user_id(&user).await.unwrap();
        store.save_download(&download_for(&user, "kubeadm")).await.unwrap();

        let recent = store.get_recent_downloads(&user, 5).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].binary, "kubeadm");
        store.close().await;
    }

    #[tokio::test]
    async fn test_summary_leaves_unprojected_fields_default() {
        let store = RecordStore::open(":memory:").await.unwrap();
        let user = UserId::new(Duration::days(1));
        store.save_user_id(&user).await.unwrap();
        store.save_download(&download_for(&user, "kubelet")).await.unwrap();

        let recent = store.get_recent_downloads(&user, 1).await.unwrap();
        let summary = &recent[0];
        assert!(summary.user.is_empty());
        assert!(summary.filter_set.is_empty());
        assert!(summary.url.is_empty());
        assert_eq!(summary.downloaded.timestamp(), 0);
    }

    #[test]
    fn test_stream_error_splits_on_first_row() {
        assert!(matches!(
            stream_error(true, sqlx::Error::RowNotFound),
            StoreError::Execute { operation: "get_recent_downloads", .. }
        ));
        assert!(matches!(
            stream_error(false, sqlx::Error::RowNotFound),
            StoreError::Cursor { operation: "get_recent_downloads", .. }
        ));
    }

    #[tokio::test]
    async fn test_duplicate_user_id_is_cardinality_violation() {
        let store = RecordStore::open(":memory:").await.unwrap();
        let user = UserId::new(Duration::days(1));
        store.save_user_id(&user).await.unwrap();

        let err = store.save_user_id(&user).await.unwrap_err();
        assert!(
            matches!(err, StoreError::RowsAffected { actual: 0, .. }),
            "unexpected error: {:?}",
            err
        );
    }
}
