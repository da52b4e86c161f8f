use async_trait::async_trait;

use crate::{
    errors::FetchError,
    stats::StatsPayload,
};

/// The upstream side of a collection run.
///
/// [`PortalCollector`](crate::collectors::PortalCollector) is the production
/// implementation; tests substitute scripted sources.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Retrieve and validate the current statistics payload.
    async fn fetch(&self) -> Result<StatsPayload, FetchError>;
}
