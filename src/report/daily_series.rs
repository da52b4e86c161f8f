use std::collections::{
    btree_map::Entry,
    BTreeMap,
};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::stats::Snapshot;

/// Formats the portal has used for its `LastUpdated` label.
const PROVIDER_DATE_FORMATS: &[&str] = &["%d-%b-%Y", "%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];

/// Best-effort parse of the upstream's free-text "as of" label.
pub fn parse_provider_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    PROVIDER_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Per-counter difference versus the previous provider date. Signed, since
/// the provider occasionally restates a counter downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterDelta {
    pub indv_reg_users: i64,
    pub e_verified_returns: i64,
    pub total_aadhar_linked_pan: i64,
    pub total_processed_refund: i64,
}

impl CounterDelta {
    fn between(current: &Snapshot, previous: &Snapshot) -> Self {
        Self {
            indv_reg_users: current.indv_reg_users as i64 - previous.indv_reg_users as i64,
            e_verified_returns: current.e_verified_returns as i64
                - previous.e_verified_returns as i64,
            total_aadhar_linked_pan: current.total_aadhar_linked_pan as i64
                - previous.total_aadhar_linked_pan as i64,
            total_processed_refund: current.total_processed_refund as i64
                - previous.total_processed_refund as i64,
        }
    }
}

/// The freshest snapshot for one provider date, delta-annotated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyEntry {
    pub provider_date: NaiveDate,
    pub snapshot: Snapshot,
    /// `None` for the first entry of the series.
    pub delta: Option<CounterDelta>,
}

/// Deduplicated one-row-per-provider-date series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySeries {
    pub entries: Vec<DailyEntry>,
    /// Snapshots excluded because their provider label was absent or
    /// unparsable. Dropped records stay visible instead of silently vanishing.
    pub skipped_unparsable: usize,
}

/// Reconstruct the display series from raw snapshots.
///
/// Snapshots group by the calendar date parsed out of their provider label;
/// within a group the freshest capture wins, ties broken by the later
/// insertion (higher id). Entries sort ascending by provider date and each
/// one after the first carries counter deltas versus its predecessor.
pub fn latest_per_provider_date(snapshots: Vec<Snapshot>) -> DailySeries {
    let mut skipped = 0usize;
    let mut by_date: BTreeMap<NaiveDate, Snapshot> = BTreeMap::new();

    for snapshot in snapshots {
        let parsed = snapshot
            .provider_last_updated_raw
            .as_deref()
            .and_then(parse_provider_date);
        let Some(provider_date) = parsed else {
            skipped += 1;
            continue;
        };

        match by_date.entry(provider_date) {
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if (snapshot.collected_at, snapshot.id) > (current.collected_at, current.id) {
                    slot.insert(snapshot);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(snapshot);
            }
        }
    }

    if skipped > 0 {
        warn!(
            skipped,
            "snapshots excluded from series: provider label missing or unparsable"
        );
    }

    let mut entries = Vec::with_capacity(by_date.len());
    let mut previous: Option<Snapshot> = None;
    for (provider_date, snapshot) in by_date {
        let delta = previous
            .as_ref()
            .map(|prev| CounterDelta::between(&snapshot, prev));
        entries.push(DailyEntry {
            provider_date,
            snapshot: snapshot.clone(),
            delta,
        });
        previous = Some(snapshot);
    }

    DailySeries {
        entries,
        skipped_unparsable: skipped,
    }
}
