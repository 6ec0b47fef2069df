//! Record types persisted by the store

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Anonymous client identifier with a validity window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserId {
    pub id: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl UserId {
    /// Mint a fresh random identifier valid from now for `ttl`
    pub fn new(ttl: Duration) -> Self {
        let created = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created,
            expires: created + ttl,
        }
    }

    /// Identifier-only value, enough to look up downloads
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Expiry is logical only; expired ids are never deleted
    pub fn is_expired_at(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.expires
    }
}

/// One recorded artifact download
///
/// Reads from [`RecordStore::get_recent_downloads`](super::RecordStore::get_recent_downloads)
/// only fill the platform and artifact fields; the rest stay at their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    /// Owning [`UserId::id`]
    pub user: String,
    pub downloaded: DateTime<Utc>,
    /// Selection criteria that produced this artifact
    pub filter_set: String,
    pub operating_system: String,
    pub architecture: String,
    pub version: String,
    pub binary: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_id_window() {
        let user = UserId::new(Duration::hours(24));
        assert!(!user.id.is_empty());
        assert_eq!(user.expires - user.created, Duration::hours(24));
        assert!(!user.is_expired_at(user.created));
        assert!(user.is_expired_at(user.expires));
    }

    #[test]
    fn test_new_user_ids_are_unique() {
        let a = UserId::new(Duration::minutes(1));
        let b = UserId::new(Duration::minutes(1));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_download_default_is_empty() {
        let dl = Download::default();
        assert!(dl.user.is_empty());
        assert!(dl.url.is_empty());
        assert_eq!(dl.downloaded.timestamp(), 0);
    }
}
