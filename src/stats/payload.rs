use serde::{
    de,
    Deserialize,
    Deserializer,
    Serialize,
};

/// Validated, immutable result of one successful fetch.
///
/// Field names on the wire (`IndvRegUsers`, `eVerifiedReturns`, ...) are the
/// upstream's contract and must track the portal if it ever renames them.
/// Unknown fields are ignored so new upstream counters do not break parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsPayload {
    #[serde(rename = "IndvRegUsers", deserialize_with = "count_field")]
    pub indv_reg_users: u64,

    #[serde(rename = "eVerifiedReturns", deserialize_with = "count_field")]
    pub e_verified_returns: u64,

    #[serde(rename = "TotalAadharLinkedPAN", deserialize_with = "count_field")]
    pub total_aadhar_linked_pan: u64,

    #[serde(rename = "TotalProcessedRefund", deserialize_with = "count_field")]
    pub total_processed_refund: u64,

    /// Upstream "as of" label, e.g. `26-Jul-2025`. Format not guaranteed.
    #[serde(
        rename = "LastUpdated",
        default,
        deserialize_with = "optional_label"
    )]
    pub provider_last_updated_raw: Option<String>,
}

/// The portal has served counters both as JSON numbers and as numeric strings.
fn count_field<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Number(u64),
        Text(String),
    }

    match RawCount::deserialize(deserializer)? {
        RawCount::Number(value) => Ok(value),
        RawCount::Text(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|err| de::Error::custom(format!("invalid counter value {text:?}: {err}"))),
    }
}

/// Missing, null and empty labels all normalize to `None`.
fn optional_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|label| {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    }))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SAMPLE: &str = r#"{
        "IndvRegUsers": 138724907,
        "eVerifiedReturns": "78901234",
        "TotalAadharLinkedPAN": 60123456,
        "TotalProcessedRefund": 45012345,
        "LastUpdated": "26-Jul-2025",
        "SomeNewUpstreamField": 42
    }"#;

    #[test]
    fn parses_counters_and_label_exactly() {
        let payload: StatsPayload = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(
            payload,
            StatsPayload {
                indv_reg_users: 138724907,
                e_verified_returns: 78901234,
                total_aadhar_linked_pan: 60123456,
                total_processed_refund: 45012345,
                provider_last_updated_raw: Some("26-Jul-2025".to_owned()),
            }
        );
    }

    #[test]
    fn missing_required_counter_is_an_error() {
        for field in [
            "IndvRegUsers",
            "eVerifiedReturns",
            "TotalAadharLinkedPAN",
            "TotalProcessedRefund",
        ] {
            let mut value: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
            value.as_object_mut().unwrap().remove(field);
            let result = serde_json::from_value::<StatsPayload>(value);
            assert!(result.is_err(), "expected error without {field}");
        }
    }

    #[test]
    fn negative_counter_is_an_error() {
        let mut value: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
        value["IndvRegUsers"] = serde_json::json!(-1);
        assert!(serde_json::from_value::<StatsPayload>(value).is_err());
    }

    #[test]
    fn absent_or_empty_label_becomes_none() {
        let mut value: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
        value.as_object_mut().unwrap().remove("LastUpdated");
        let payload: StatsPayload = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(payload.provider_last_updated_raw, None);

        value["LastUpdated"] = serde_json::json!("  ");
        let payload: StatsPayload = serde_json::from_value(value).unwrap();
        assert_eq!(payload.provider_last_updated_raw, None);
    }
}
