//! Error handling for the download record store

use thiserror::Error;

/// Errors returned by [`RecordStore`](crate::database::RecordStore)
///
/// Every storage failure keeps the underlying `sqlx` error as its source;
/// the variant says which step failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to database '{target}'")]
    Connect {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to create table '{table}'")]
    Schema {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to prepare {statement} statement")]
    Prepare {
        statement: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation} failed")]
    Execute {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation} failed while reading rows")]
    Cursor {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation}: more or less than 1 row affected: {actual}")]
    RowsAffected { operation: &'static str, actual: u64 },

    #[error("failed to read column '{column}' from result row")]
    Scan {
        column: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("unsupported SQL dialect: {0}")]
    UnsupportedDialect(String),
}

impl StoreError {
    /// True when an insert touched a row count other than exactly one
    pub fn is_cardinality_violation(&self) -> bool {
        matches!(self, StoreError::RowsAffected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_affected_message_reports_count() {
        let err = StoreError::RowsAffected {
            operation: "save_user_id",
            actual: 0,
        };
        assert_eq!(
            err.to_string(),
            "save_user_id: more or less than 1 row affected: 0"
        );
        assert!(err.is_cardinality_violation());
    }

    #[test]
    fn test_storage_errors_keep_source() {
        let err = StoreError::Execute {
            operation: "save_download",
            source: sqlx::Error::RowNotFound,
        };
        assert!(!err.is_cardinality_violation());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_cursor_error_is_distinct_from_execute() {
        let err = StoreError::Cursor {
            operation: "get_recent_downloads",
            source: sqlx::Error::RowNotFound,
        };
        assert_eq!(err.to_string(), "get_recent_downloads failed while reading rows");
        assert!(!err.is_cardinality_violation());
        assert!(std::error::Error::source(&err).is_some());
    }
}
