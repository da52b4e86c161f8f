pub mod payload;
pub mod snapshot;

// Re-export the main types for easy access
pub use payload::StatsPayload;
pub use snapshot::{
    NewSnapshot,
    Snapshot,
};
