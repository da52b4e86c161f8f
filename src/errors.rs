use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of one fetch from the stats endpoint, or of the whole retry run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the response body could not be read.
    #[error("request to the stats endpoint failed")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("stats endpoint returned HTTP {0}")]
    Status(StatusCode),

    /// The body was not JSON, or a required counter field was missing.
    #[error("stats payload did not match the expected shape: {0}")]
    Malformed(#[from] serde_json::Error),

    /// All attempts failed; carries the last underlying cause.
    #[error("giving up after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        source: Box<FetchError>,
    },
}

/// Failure to initialize or write the snapshot store. Never retried here.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite operation failed")]
    Sqlite(#[from] rusqlite::Error),

    #[error("could not create database directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `collected_at` text that is neither RFC 3339 nor a naive UTC datetime.
    #[error("stored timestamp {0:?} is not a recognized datetime")]
    BadTimestamp(String),
}

/// Anything that can end a collection run abnormally.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
