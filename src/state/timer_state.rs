//! Timer state snapshot mirrored from the foreground app

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::utils::coerce_seconds;

/// Last known workout timer state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerStateSnapshot {
    /// Elapsed workout time in seconds
    pub gym_seconds: u64,
    /// Elapsed rest time in seconds
    pub rest_seconds: u64,
    pub series_count: u64,
    pub gym_running: bool,
    pub rest_running: bool,
    /// User opt-in for the persistent notification
    pub notifications_enabled: bool,
}

impl TimerStateSnapshot {
    /// Create a zeroed, paused snapshot with notifications off
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the fields present in `update`, keeping the rest
    pub fn merged(mut self, update: &PartialTimerState) -> Self {
        if let Some(v) = update.gym_seconds {
            self.gym_seconds = v;
        }
        if let Some(v) = update.rest_seconds {
            self.rest_seconds = v;
        }
        if let Some(v) = update.series_count {
            self.series_count = v;
        }
        if let Some(v) = update.gym_running {
            self.gym_running = v;
        }
        if let Some(v) = update.rest_running {
            self.rest_running = v;
        }
        if let Some(v) = update.notifications_enabled {
            self.notifications_enabled = v;
        }
        self
    }
}

/// Incremental update posted by the foreground; absent fields stay untouched.
///
/// Numeric fields accept any JSON value and coerce it to a non-negative
/// integer. Flags follow JavaScript truthiness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialTimerState {
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub gym_seconds: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub rest_seconds: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub series_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_flag", skip_serializing_if = "Option::is_none")]
    pub gym_running: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag", skip_serializing_if = "Option::is_none")]
    pub rest_running: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag", skip_serializing_if = "Option::is_none")]
    pub notifications_enabled: Option<bool>,
}

impl PartialTimerState {
    /// An update that sets every field from `snapshot`
    pub fn full(snapshot: &TimerStateSnapshot) -> Self {
        Self {
            gym_seconds: Some(snapshot.gym_seconds),
            rest_seconds: Some(snapshot.rest_seconds),
            series_count: Some(snapshot.series_count),
            gym_running: Some(snapshot.gym_running),
            rest_running: Some(snapshot.rest_running),
            notifications_enabled: Some(snapshot.notifications_enabled),
        }
    }

    /// Parse a message payload. Anything that is not an object carries no fields.
    pub fn from_payload(payload: Option<&Value>) -> Self {
        match payload {
            Some(value @ Value::Object(_)) => {
                serde_json::from_value(value.clone()).unwrap_or_default()
            }
            _ => Self::default(),
        }
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Some(coerce_seconds(&value)))
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let truthy = match &value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    };
    Ok(Some(truthy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_update_only_overwrites_present_fields() {
        let prior = TimerStateSnapshot {
            gym_seconds: 10,
            series_count: 2,
            gym_running: true,
            ..TimerStateSnapshot::new()
        };
        let update = PartialTimerState::from_payload(Some(&json!({ "seriesCount": 5 })));

        let merged = prior.merged(&update);

        assert_eq!(merged.gym_seconds, 10);
        assert_eq!(merged.series_count, 5);
        assert!(merged.gym_running);
        assert!(!merged.notifications_enabled);
    }

    #[test]
    fn test_garbage_numbers_become_zero() {
        let update = PartialTimerState::from_payload(Some(&json!({
            "gymSeconds": "nope",
            "restSeconds": -30,
            "seriesCount": null,
        })));

        assert_eq!(update.gym_seconds, Some(0));
        assert_eq!(update.rest_seconds, Some(0));
        assert_eq!(update.series_count, Some(0));
        assert_eq!(update.gym_running, None);
    }

    #[test]
    fn test_flags_follow_truthiness() {
        let update = PartialTimerState::from_payload(Some(&json!({
            "gymRunning": 1,
            "restRunning": "",
            "notificationsEnabled": "yes",
        })));

        assert_eq!(update.gym_running, Some(true));
        assert_eq!(update.rest_running, Some(false));
        assert_eq!(update.notifications_enabled, Some(true));
    }

    #[test]
    fn test_non_object_payload_is_empty() {
        assert_eq!(PartialTimerState::from_payload(Some(&json!(7))), PartialTimerState::default());
        assert_eq!(PartialTimerState::from_payload(None), PartialTimerState::default());
    }

    #[test]
    fn test_snapshot_uses_camel_case_on_the_wire() {
        let snapshot = TimerStateSnapshot {
            gym_seconds: 3,
            notifications_enabled: true,
            ..TimerStateSnapshot::new()
        };
        let value = serde_json::to_value(snapshot).unwrap();
        assert_eq!(value["gymSeconds"], 3);
        assert_eq!(value["notificationsEnabled"], true);
    }
}
