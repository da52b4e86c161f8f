//! # Configuration Module
//!
//! Runtime configuration for a collection run, assembled from CLI arguments
//! and environment variables in `main`.
//!
//! ## Configuration Fields
//!
//! - **Endpoint**: the public statistics URL, validated at construction
//! - **Database path**: the SQLite file holding snapshots
//! - **Cadence**: minimum age of the newest snapshot before collecting again
//! - **HTTP settings**: per-request timeout
//! - **Force**: bypass the cadence check for manual runs

use std::{
    path::PathBuf,
    time::Duration,
};

use eyre::Result;
use serde::{
    Deserialize,
    Serialize,
};
use url::Url;

/// The public statistics endpoint of the Income Tax e-portal.
pub const DEFAULT_ENDPOINT: &str =
    "https://eportal.incometax.gov.in/iec/oursuccessenablers/saveData";

/// Default location of the snapshot database.
pub const DEFAULT_DB_PATH: &str = "data/itrstats.sqlite3";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub endpoint_url: Url,
    pub db_path: PathBuf,
    /// Minimum age of the newest snapshot before a new one is collected.
    pub min_snapshot_age: Duration,
    pub request_timeout: Duration,
    /// Collect even when the newest snapshot is recent.
    pub force: bool,
}

impl Config {
    pub fn new(
        endpoint_url: &str,
        db_path: PathBuf,
        min_snapshot_age: Duration,
        request_timeout: Duration,
        force: bool,
    ) -> Result<Self> {
        let endpoint_url = Url::parse(endpoint_url)?;
        if !matches!(endpoint_url.scheme(), "http" | "https") {
            return Err(eyre::eyre!(
                "endpoint URL must be http(s), got: {endpoint_url}"
            ));
        }

        Ok(Self {
            endpoint_url,
            db_path,
            min_snapshot_age,
            request_timeout,
            force,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_default_endpoint() {
        let config = Config::new(
            DEFAULT_ENDPOINT,
            PathBuf::from(DEFAULT_DB_PATH),
            Duration::from_secs(4 * 60 * 60),
            Duration::from_secs(20),
            false,
        )
        .unwrap();
        assert_eq!(config.endpoint_url.as_str(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn rejects_non_http_endpoints() {
        assert!(Config::new(
            "ftp://example.com/stats",
            PathBuf::from("stats.sqlite3"),
            Duration::from_secs(1),
            Duration::from_secs(1),
            false,
        )
        .is_err());

        assert!(Config::new(
            "not a url",
            PathBuf::from("stats.sqlite3"),
            Duration::from_secs(1),
            Duration::from_secs(1),
            false,
        )
        .is_err());
    }
}
