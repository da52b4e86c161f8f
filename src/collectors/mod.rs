//! # Collectors Module
//!
//! The collection side of the gatherer.
//!
//! ## Architecture
//!
//! - **`StatsSource` trait**: upstream abstraction for one statistics retrieval
//! - **`PortalCollector`**: HTTP fetcher with browser-like headers and a
//!   jittered exponential-backoff retry loop
//! - **`gate`**: the cadence check that keeps over-frequent invocations
//!   from hammering the upstream
//! - **`Orchestrator`**: runs store init, gate check, fetch and insert for
//!   one scheduled invocation

pub mod gate;
pub mod orchestrator;
pub mod portal_collector;
pub mod source;

// Re-export the main types for easy access
pub use gate::{
    should_collect,
    GateDecision,
    MIN_SNAPSHOT_AGE,
};
pub use orchestrator::{
    CollectOutcome,
    Orchestrator,
};
pub use portal_collector::{
    run_with_retry,
    PortalCollector,
    RetryPolicy,
};
pub use source::StatsSource;
