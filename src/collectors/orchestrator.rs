use chrono::{
    DateTime,
    Utc,
};
use tracing::{
    info,
    warn,
};

use crate::{
    collectors::{
        gate::should_collect,
        PortalCollector,
        StatsSource,
    },
    config::Config,
    errors::{
        CollectError,
        StoreError,
    },
    stats::{
        NewSnapshot,
        Snapshot,
    },
    store::SnapshotStore,
};

/// Result of one scheduled invocation.
///
/// Abnormal termination (fetch or store failure) is the `Err` branch of
/// [`Orchestrator::collect_once`], so the external scheduler's logs
/// distinguish real failures from quiet runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectOutcome {
    /// The gatekeeper declined; nothing was fetched or written.
    Skipped { reason: String },
    /// A payload was fetched and persisted.
    Collected(Snapshot),
}

/// Coordinates one collection run: store init, gate check, fetch, insert.
pub struct Orchestrator<S: StatsSource> {
    config: Config,
    source: S,
}

impl Orchestrator<PortalCollector> {
    /// Orchestrator against the real e-portal endpoint.
    pub fn new(config: Config) -> Result<Self, CollectError> {
        let source = PortalCollector::new(&config).map_err(CollectError::Fetch)?;
        Ok(Self::with_source(config, source))
    }
}

impl<S: StatsSource> Orchestrator<S> {
    pub fn with_source(config: Config, source: S) -> Self {
        Self { config, source }
    }

    /// One collection pass against the current wall clock.
    pub async fn collect_once(&self) -> Result<CollectOutcome, CollectError> {
        self.collect_at(Utc::now()).await
    }

    /// One collection pass against an explicit capture time.
    pub async fn collect_at(&self, now: DateTime<Utc>) -> Result<CollectOutcome, CollectError> {
        let mut store = SnapshotStore::open(&self.config.db_path)?;
        store.init()?;

        if self.config.force {
            info!("gate check bypassed");
        } else {
            let last = match store.latest_collected_at() {
                Ok(last) => last,
                // A timestamp we cannot read must not wedge collection forever.
                Err(StoreError::BadTimestamp(raw)) => {
                    warn!(%raw, "could not parse last snapshot timestamp, collecting anyway");
                    None
                }
                Err(err) => return Err(err.into()),
            };

            let decision = should_collect(last, now, self.config.min_snapshot_age);
            if !decision.collect {
                info!(reason = %decision.reason, "skipping collection");
                return Ok(CollectOutcome::Skipped {
                    reason: decision.reason,
                });
            }
            info!(reason = %decision.reason, "collection due");
        }

        let payload = self.source.fetch().await?;
        let snapshot = store.insert(&NewSnapshot::from_payload(payload, now))?;
        info!(
            id = snapshot.id,
            e_verified_returns = snapshot.e_verified_returns,
            total_processed_refund = snapshot.total_processed_refund,
            provider_label = ?snapshot.provider_last_updated_raw,
            "snapshot stored"
        );
        Ok(CollectOutcome::Collected(snapshot))
    }
}
