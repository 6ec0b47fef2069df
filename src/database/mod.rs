//! Database module

pub mod models;
pub mod operations;
pub mod schema;

// Re-export for convenience
pub use models::{Download, UserId};
pub use operations::RecordStore;
pub use schema::Dialect;
