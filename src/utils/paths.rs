//! Platform path resolution for the default database location
//!
//! Relative paths resolve against the current working directory, which is
//! not stable for services started by a supervisor. The default database
//! therefore lives under the platform data directory:
//! - Linux: `$XDG_DATA_HOME/downloadkube/` or `~/.local/share/downloadkube/`
//! - macOS: `~/Library/Application Support/downloadkube/`
//! - Windows: `{FOLDERID_RoamingAppData}\downloadkube\`

use std::path::PathBuf;
use tracing::{debug, warn};

const APP_DIR_NAME: &str = "downloadkube";
const DATABASE_FILE_NAME: &str = "downloads.db";

/// Get the data directory for downloadkube.
///
/// Does not create the directory; opening the store creates the database
/// file, not its parents.
pub fn get_data_dir() -> PathBuf {
    let dir = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .unwrap_or_else(|| {
            warn!("Could not determine a data directory, using the temp dir");
            std::env::temp_dir()
        })
        .join(APP_DIR_NAME);

    debug!("Data directory: {:?}", dir);
    dir
}

/// Get the default database path.
///
/// Returns: `<data dir>/downloadkube/downloads.db`
pub fn get_database_path() -> PathBuf {
    get_data_dir().join(DATABASE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_is_not_relative() {
        let path = get_data_dir();
        assert!(path.is_absolute(), "Data dir must be absolute path");
        assert!(path.ends_with(APP_DIR_NAME));
    }

    #[test]
    fn test_database_path_is_not_relative() {
        let path = get_database_path();
        assert!(path.is_absolute(), "Database path must be absolute path");
        assert!(
            path.to_string_lossy().ends_with("downloads.db"),
            "Database path must end with downloads.db"
        );
    }
}
