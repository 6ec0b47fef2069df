//! Utility modules for error handling and configuration

pub mod config;
pub mod error;
pub mod paths;

// Re-export for convenience
pub use config::StoreConfig;
pub use error::StoreError;
pub use paths::{get_data_dir, get_database_path};
