use std::{
    io,
    path::PathBuf,
};

use anyhow::Result;
use async_trait::async_trait;
use fs4::tokio::AsyncFileExt;
use serde_json::Value;
use tokio::fs::File;
use tracing::{debug, warn};

use crate::fs::operations::{read_optional, replace_file};

use super::entities::UsageEvent;

/// Fixed identifier of the record holding the usage log.
pub const STORE_KEY: &str = "nudgeblock_stats";

/// Durable append-only log of usage events.
#[async_trait]
pub trait UsageLogStore: Send + Sync {
    /// Adds one event. The event is on disk when this returns, so a following [list] sees it.
    ///
    /// [list]: UsageLogStore::list
    async fn append(&self, event: UsageEvent) -> Result<()>;

    /// Full log in chronological order. Missing or unreadable data is an empty log.
    async fn list(&self) -> Vec<UsageEvent>;
}

/// The main realization of [UsageLogStore]. Writers and readers in different processes are
/// serialized through an advisory lock on a sidecar file, the record itself is replaced
/// atomically.
pub struct JsonUsageLog {
    record_path: PathBuf,
    lock_path: PathBuf,
}

impl JsonUsageLog {
    pub fn new(dir: PathBuf) -> Result<Self, io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            record_path: dir.join(format!("{STORE_KEY}.json")),
            lock_path: dir.join(format!("{STORE_KEY}.lock")),
        })
    }

    #[cfg(test)]
    pub fn record_path(&self) -> &std::path::Path {
        &self.record_path
    }

    fn backup_path(&self) -> PathBuf {
        self.record_path.with_extension("json.bak")
    }

    async fn open_lock(&self) -> Result<File, io::Error> {
        File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(&self.lock_path)
            .await
    }

    /// Reads the record as raw entries. Only IO failures are errors.
    async fn read_content(&self) -> Result<RecordContent, io::Error> {
        let Some(bytes) = read_optional(&self.record_path).await? else {
            debug!("No usage record at {:?} yet", self.record_path);
            return Ok(RecordContent::Entries(vec![]));
        };
        match serde_json::from_slice::<Vec<Value>>(&bytes) {
            Ok(entries) => Ok(RecordContent::Entries(entries)),
            Err(e) => {
                warn!(
                    "Usage record {:?} is corrupted, treating it as empty: {e}",
                    self.record_path
                );
                Ok(RecordContent::Corrupted(bytes))
            }
        }
    }

    async fn list_locked(&self) -> Result<Vec<UsageEvent>, io::Error> {
        let lock = self.open_lock().await?;
        lock.lock_shared()?;
        let result = self.read_content().await;
        lock.unlock_async().await?;
        Ok(result?.into_events())
    }

    /// Entries that don't parse are kept in the record as they are, only the new event is added.
    /// A record that isn't an array at all is moved aside before being replaced.
    async fn append_locked(&self, event: UsageEvent) -> Result<()> {
        let mut entries = match self.read_content().await? {
            RecordContent::Entries(entries) => entries,
            RecordContent::Corrupted(bytes) => {
                let backup = self.backup_path();
                warn!("Keeping corrupted usage record as {backup:?}");
                replace_file(&backup, &bytes).await?;
                vec![]
            }
        };
        entries.push(serde_json::to_value(&event)?);
        let buffer = serde_json::to_vec(&entries)?;
        replace_file(&self.record_path, &buffer).await?;
        Ok(())
    }
}

enum RecordContent {
    Entries(Vec<Value>),
    /// Bytes of a record that isn't a JSON array.
    Corrupted(Vec<u8>),
}

impl RecordContent {
    fn into_events(self) -> Vec<UsageEvent> {
        let RecordContent::Entries(entries) = self else {
            return vec![];
        };
        entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                serde_json::from_value::<UsageEvent>(entry)
                    .inspect_err(|e| warn!("Skipping usage entry {index}: {e}"))
                    .ok()
            })
            .collect()
    }
}

#[async_trait]
impl UsageLogStore for JsonUsageLog {
    async fn append(&self, event: UsageEvent) -> Result<()> {
        debug!("Appending usage event {:?}", event);
        let lock = self.open_lock().await?;
        // Semi-safe acquire-release for the record
        lock.lock_exclusive()?;
        let result = self.append_locked(event).await;
        lock.unlock_async().await?;
        result
    }

    async fn list(&self) -> Vec<UsageEvent> {
        match self.list_locked().await {
            Ok(events) => events,
            Err(e) => {
                warn!("Couldn't read usage record {:?}: {e}", self.record_path);
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::{
        storage::{
            entities::UsageEvent,
            usage_log::{JsonUsageLog, UsageLogStore},
        },
        utils::logging::TEST_LOGGING,
    };

    fn event(app: &str, duration: u32, offset_minutes: i64) -> UsageEvent {
        UsageEvent::new(
            app,
            duration,
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::minutes(offset_minutes),
        )
    }

    #[tokio::test]
    async fn test_missing_record_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonUsageLog::new(dir.path().to_owned())?;
        assert!(store.list().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_append_then_list() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonUsageLog::new(dir.path().to_owned())?;

        let first = event("Instagram", 5, 0);
        let second = event("YouTube", 3, 5);
        store.append(first.clone()).await?;
        assert_eq!(store.list().await, vec![first.clone()]);

        store.append(second.clone()).await?;
        assert_eq!(store.list().await, vec![first, second]);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_survives_reopen() -> Result<()> {
        let dir = tempdir()?;
        let stored = event("Browser", 2, 0);
        JsonUsageLog::new(dir.path().to_owned())?
            .append(stored.clone())
            .await?;

        let reopened = JsonUsageLog::new(dir.path().to_owned())?;
        assert_eq!(reopened.list().await, vec![stored]);
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupted_record_is_empty_and_heals() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = JsonUsageLog::new(dir.path().to_owned())?;
        std::fs::write(store.record_path(), "{not json at all")?;

        assert!(store.list().await.is_empty());

        let healed = event("TikTok", 1, 0);
        store.append(healed.clone()).await?;
        assert_eq!(store.list().await, vec![healed]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("nudgeblock_stats.json.bak"))?,
            "{not json at all"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_entry_does_not_hide_the_rest() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = JsonUsageLog::new(dir.path().to_owned())?;
        std::fs::write(
            store.record_path(),
            r#"[
                {"id":"1","appName":"YouTube","duration":5,"date":"2024-05-01T09:00:00.000Z"},
                {"id":"2","appName":"TikTok","duration":2.5,"date":"2024-05-01T09:10:00.000Z"}
            ]"#,
        )?;

        let events = store.list().await;
        assert_eq!(events.len(), 1);
        assert_eq!(&*events[0].app_name, "YouTube");

        let added = event("Browser", 1, 20);
        store.append(added.clone()).await?;
        let events = store.list().await;
        assert_eq!(events.len(), 2);
        assert_eq!(&*events[0].app_name, "YouTube");
        assert_eq!(events[1], added);

        // The unreadable entry stays in the record untouched.
        let raw: Vec<serde_json::Value> =
            serde_json::from_slice(&std::fs::read(store.record_path())?)?;
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[1]["appName"], "TikTok");
        assert_eq!(raw[1]["duration"], 2.5);
        Ok(())
    }

    #[tokio::test]
    async fn test_reads_externally_written_record() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonUsageLog::new(dir.path().to_owned())?;
        std::fs::write(
            store.record_path(),
            r#"[{"id":"1","appName":"WhatsApp","duration":4,"date":"2024-05-01T09:00:00.000Z"}]"#,
        )?;

        let events = store.list().await;
        assert_eq!(events.len(), 1);
        assert_eq!(&*events[0].app_name, "WhatsApp");
        assert_eq!(events[0].duration, 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_rapid_appends_keep_every_event() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonUsageLog::new(dir.path().to_owned())?;
        let now = Utc::now();
        for _ in 0..10 {
            store.append(UsageEvent::new("YouTube", 1, now)).await?;
        }

        let events = store.list().await;
        assert_eq!(events.len(), 10);
        let mut ids = events.iter().map(|v| v.id.clone()).collect::<Vec<_>>();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
        Ok(())
    }
}
