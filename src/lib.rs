//! Download record store
//!
//! Records which users downloaded which build artifacts and when, and reads
//! back recent download history per user. Backed by SQLite through `sqlx`.

pub mod database;
pub mod utils;

// Re-export main types for easier use
pub use database::{Dialect, Download, RecordStore, UserId};
pub use utils::{StoreConfig, StoreError};
