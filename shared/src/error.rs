//! Error types for the site sync Lambda.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while syncing the site.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Calendar API request or response failure
    #[error("Calendar fetch error: {0}")]
    CalendarFetch(String),

    /// S3 PutObject failure
    #[error("Storage write error: {0}")]
    StorageWrite(String),

    /// Repository tree listing failure
    #[error("Repository list error: {0}")]
    RepositoryList(String),

    /// Raw file download failure for a single repository path
    #[error("Repository file fetch error: {0}")]
    RepositoryFileFetch(String),

    /// CloudFront invalidation failure
    #[error("Invalidation error: {0}")]
    Invalidation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
