//! End-to-end collection flow against a scripted source and a temp database.

use std::{
    path::PathBuf,
    sync::{
        atomic::{
            AtomicU32,
            Ordering,
        },
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{
    DateTime,
    TimeDelta,
    TimeZone,
    Utc,
};
use itr_stats_gatherer::{
    config::{
        Config,
        DEFAULT_ENDPOINT,
    },
    CollectError,
    CollectOutcome,
    FetchError,
    Orchestrator,
    SnapshotStore,
    StatsPayload,
    StatsSource,
};

struct CountingSource {
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl StatsSource for CountingSource {
    async fn fetch(&self) -> Result<StatsPayload, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(StatsPayload {
            indv_reg_users: 138724907,
            e_verified_returns: 78901234,
            total_aadhar_linked_pan: 60123456,
            total_processed_refund: 45012345,
            provider_last_updated_raw: Some("01-Aug-2025".to_owned()),
        })
    }
}

struct FailingSource;

#[async_trait]
impl StatsSource for FailingSource {
    async fn fetch(&self) -> Result<StatsPayload, FetchError> {
        Err(FetchError::Exhausted {
            attempts: 5,
            source: Box::new(FetchError::Status(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
            )),
        })
    }
}

fn config(db_path: PathBuf) -> Config {
    Config::new(
        DEFAULT_ENDPOINT,
        db_path,
        Duration::from_secs(4 * 60 * 60),
        Duration::from_secs(20),
        false,
    )
    .unwrap()
}

fn row_count(db_path: &std::path::Path) -> usize {
    let store = SnapshotStore::open(db_path).unwrap();
    store.init().unwrap();
    store.read_all().unwrap().len()
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 1, 6, 0, 0).unwrap()
}

#[tokio::test]
async fn collects_skips_then_collects_again_past_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("itrstats.sqlite3");

    let calls = Arc::new(AtomicU32::new(0));
    let orchestrator = Orchestrator::with_source(
        config(db_path.clone()),
        CountingSource {
            calls: calls.clone(),
        },
    );

    // Empty store: the first run collects and inserts exactly one row.
    let outcome = orchestrator.collect_at(t0()).await.unwrap();
    match outcome {
        CollectOutcome::Collected(snapshot) => {
            assert_eq!(snapshot.id, 1);
            assert_eq!(snapshot.e_verified_returns, 78901234);
            assert_eq!(snapshot.collected_date, "2025-08-01");
        }
        other => panic!("expected Collected, got {other:?}"),
    }
    assert_eq!(row_count(&db_path), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // An immediate second invocation is inside the window and fetches nothing.
    let outcome = orchestrator
        .collect_at(t0() + TimeDelta::minutes(1))
        .await
        .unwrap();
    assert!(matches!(outcome, CollectOutcome::Skipped { .. }));
    assert_eq!(row_count(&db_path), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Past the four-hour window the fetcher runs again.
    let outcome = orchestrator
        .collect_at(t0() + TimeDelta::hours(4) + TimeDelta::minutes(1))
        .await
        .unwrap();
    assert!(matches!(outcome, CollectOutcome::Collected(_)));
    assert_eq!(row_count(&db_path), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_fetch_leaves_the_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("itrstats.sqlite3");

    let orchestrator = Orchestrator::with_source(config(db_path.clone()), FailingSource);
    let result = orchestrator.collect_at(t0()).await;

    assert!(matches!(
        result,
        Err(CollectError::Fetch(FetchError::Exhausted { attempts: 5, .. }))
    ));
    assert_eq!(row_count(&db_path), 0);
}

#[tokio::test]
async fn force_bypasses_the_gate() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("itrstats.sqlite3");

    let calls = Arc::new(AtomicU32::new(0));
    let mut config = config(db_path.clone());
    config.force = true;
    let orchestrator = Orchestrator::with_source(
        config,
        CountingSource {
            calls: calls.clone(),
        },
    );

    orchestrator.collect_at(t0()).await.unwrap();
    let outcome = orchestrator
        .collect_at(t0() + TimeDelta::minutes(1))
        .await
        .unwrap();

    assert!(matches!(outcome, CollectOutcome::Collected(_)));
    assert_eq!(row_count(&db_path), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
