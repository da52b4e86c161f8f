//! # ITR Stats Gatherer
//!
//! Collects the public statistics the Income Tax e-portal publishes
//! (registered users, e-verified returns, Aadhaar-linked PANs, processed
//! refunds), persists every retrieval as an immutable snapshot in SQLite,
//! and reconstructs a deduplicated daily series for display.
//!
//! ## Architecture
//!
//! - **`config`**: runtime configuration, validated at construction
//! - **`stats`**: the payload and snapshot data models
//! - **`collectors`**: the fetch/gate/orchestrate side of a scheduled run
//! - **`store`**: the append-only SQLite snapshot table
//! - **`report`**: series reconstruction and terminal/JSON rendering
//! - **`errors`**: typed failures (`FetchError`, `StoreError`, `CollectError`)
//!
//! ## Usage
//!
//! ```bash
//! # One scheduled collection run (skips when the newest snapshot is fresh)
//! itr-stats-gatherer collect
//!
//! # Render the daily series, optionally exporting it as JSON
//! itr-stats-gatherer report --output-file=series.json
//! ```

pub mod collectors;
pub mod config;
pub mod errors;
pub mod report;
pub mod stats;
pub mod store;

// Re-export the main types for easy access
pub use collectors::*;
pub use config::Config;
pub use errors::{
    CollectError,
    FetchError,
    StoreError,
};
pub use stats::*;
pub use store::SnapshotStore;
