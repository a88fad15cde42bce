use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed countdown. Events are never edited after creation, so every field is set here
/// and the log only grows.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UsageEvent {
    pub id: String,
    pub app_name: Arc<str>,
    /// Minutes of monitored usage, equal to the nudge interval of the expired countdown.
    pub duration: u32,
    #[serde(rename = "date", alias = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl UsageEvent {
    pub fn new(app_name: impl Into<Arc<str>>, duration: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            // Random ids stay unique for writes that land in the same millisecond.
            id: Uuid::new_v4().to_string(),
            app_name: app_name.into(),
            duration,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::UsageEvent;

    #[test]
    fn serializes_with_stored_field_names() -> anyhow::Result<()> {
        let event = UsageEvent::new("Games", 5, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        let value = serde_json::to_value(&event)?;

        assert_eq!(value["appName"], "Games");
        assert_eq!(value["duration"], 5);
        assert_eq!(value["date"], "2024-03-01T10:00:00Z");
        assert_eq!(value["id"], event.id.as_str());
        Ok(())
    }

    #[test]
    fn accepts_timestamp_alias() -> anyhow::Result<()> {
        let event: UsageEvent = serde_json::from_str(
            r#"{"id":"a","appName":"YouTube","duration":2,"timestamp":"2024-03-01T10:00:00.000Z"}"#,
        )?;
        assert_eq!(&*event.app_name, "YouTube");
        assert_eq!(event.timestamp, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        Ok(())
    }

    #[test]
    fn ids_are_unique_for_identical_events() {
        let now = Utc::now();
        let a = UsageEvent::new("TikTok", 1, now);
        let b = UsageEvent::new("TikTok", 1, now);
        assert_ne!(a.id, b.id);
    }
}
