use std::time::Duration;

use chrono::{
    DateTime,
    TimeDelta,
    Utc,
};

/// Minimum age of the newest snapshot before a new collection is due.
pub const MIN_SNAPSHOT_AGE: Duration = Duration::from_secs(4 * 60 * 60);

/// Outcome of the cadence check, with a human-readable reason for the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub collect: bool,
    pub reason: String,
}

/// Decide whether a collection attempt should run now.
///
/// Collect when no snapshot exists yet, or when the newest one is at least
/// `min_age` old. The collector may be triggered more often than the desired
/// cadence (e.g. an extra run at login on top of a timer); this check makes
/// those repeated invocations idempotent without lock files.
pub fn should_collect(
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    min_age: Duration,
) -> GateDecision {
    let Some(last) = last else {
        return GateDecision {
            collect: true,
            reason: "no previous snapshots".to_owned(),
        };
    };

    let min_age_delta = TimeDelta::from_std(min_age).unwrap_or(TimeDelta::MAX);
    let age = now.signed_duration_since(last);
    let age_text = format_age(age);

    if age >= min_age_delta {
        GateDecision {
            collect: true,
            reason: format!("last snapshot {age_text} ago"),
        }
    } else {
        GateDecision {
            collect: false,
            reason: format!(
                "last snapshot {age_text} ago (< {})",
                humantime::format_duration(min_age)
            ),
        }
    }
}

fn format_age(age: TimeDelta) -> String {
    // Truncate to whole seconds; a clock running backwards reads as "0s".
    let secs = age.num_seconds().max(0) as u64;
    humantime::format_duration(Duration::from_secs(secs)).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn collects_when_no_snapshot_exists() {
        let decision = should_collect(None, at(6, 0), MIN_SNAPSHOT_AGE);
        assert!(decision.collect);
        assert_eq!(decision.reason, "no previous snapshots");
    }

    #[test]
    fn skips_inside_the_window() {
        let decision = should_collect(Some(at(6, 0)), at(9, 59), MIN_SNAPSHOT_AGE);
        assert!(!decision.collect);
        assert!(decision.reason.contains("3h 59m"), "{}", decision.reason);
    }

    #[test]
    fn collects_past_the_window() {
        let decision = should_collect(Some(at(6, 0)), at(10, 1), MIN_SNAPSHOT_AGE);
        assert!(decision.collect);
    }

    #[test]
    fn exact_boundary_collects() {
        let decision = should_collect(Some(at(6, 0)), at(10, 0), MIN_SNAPSHOT_AGE);
        assert!(decision.collect);
    }

    #[test]
    fn last_snapshot_in_the_future_skips() {
        let decision = should_collect(Some(at(10, 0)), at(6, 0), MIN_SNAPSHOT_AGE);
        assert!(!decision.collect);
    }
}
