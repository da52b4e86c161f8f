use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::stats::StatsPayload;

/// One immutable persisted record of a successful retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Store-assigned surrogate id, monotonically increasing in insertion order.
    pub id: i64,
    pub indv_reg_users: u64,
    pub e_verified_returns: u64,
    pub total_aadhar_linked_pan: u64,
    pub total_processed_refund: u64,
    pub provider_last_updated_raw: Option<String>,
    /// Local capture time, always UTC.
    pub collected_at: DateTime<Utc>,
    /// Calendar day of `collected_at` (`YYYY-MM-DD`), stored redundantly for
    /// indexed range queries.
    pub collected_date: String,
}

/// A snapshot about to be written, before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSnapshot {
    pub indv_reg_users: u64,
    pub e_verified_returns: u64,
    pub total_aadhar_linked_pan: u64,
    pub total_processed_refund: u64,
    pub provider_last_updated_raw: Option<String>,
    pub collected_at: DateTime<Utc>,
    pub collected_date: String,
}

impl NewSnapshot {
    /// Map a fetched payload into a snapshot captured at `collected_at`.
    pub fn from_payload(payload: StatsPayload, collected_at: DateTime<Utc>) -> Self {
        Self {
            indv_reg_users: payload.indv_reg_users,
            e_verified_returns: payload.e_verified_returns,
            total_aadhar_linked_pan: payload.total_aadhar_linked_pan,
            total_processed_refund: payload.total_processed_refund,
            provider_last_updated_raw: payload.provider_last_updated_raw,
            collected_at,
            collected_date: collected_at.format("%Y-%m-%d").to_string(),
        }
    }
}
