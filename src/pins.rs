//! Durable record of guilds that stay connected when idle.
//!
//! On disk this is a flat JSON object mapping guild id to voice channel id,
//! both as strings. The whole map is rewritten on every change.

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    time::Duration,
};

use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{
    common::types::{ChannelId, GuildId},
    configs::PinsConfig,
};

const BACKOFF_BASE_MS: u64 = 50;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to write {path} after {attempts} attempts: {source}")]
    Write {
        path: String,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode pin record: {0}")]
    Encode(#[from] serde_json::Error),
}

struct Backoff {
    attempt: u32,
    max_attempts: u32,
}

impl Backoff {
    fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    fn next(&mut self) -> Duration {
        self.attempt += 1;
        Duration::from_millis(BACKOFF_BASE_MS * 2u64.pow((self.attempt - 1).min(3)))
    }

    fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

pub struct PinStore {
    path: PathBuf,
    write_attempts: u32,
    /// Mirror of the file; `None` until it has been read once.
    records: Mutex<Option<BTreeMap<String, String>>>,
}

impl PinStore {
    pub fn new(path: impl Into<PathBuf>, write_attempts: u32) -> Self {
        Self {
            path: path.into(),
            write_attempts,
            records: Mutex::new(None),
        }
    }

    pub fn from_config(config: &PinsConfig) -> Self {
        Self::new(&config.path, config.write_attempts)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns every pinned guild. The file is read on first access only;
    /// later calls see the in-memory record including changes made since.
    pub async fn load(&self) -> HashMap<GuildId, ChannelId> {
        let records = self.loaded_records().await;
        let mut pins = HashMap::with_capacity(records.len());
        for (guild, channel) in records.iter() {
            match channel.parse::<ChannelId>() {
                Ok(channel_id) => {
                    pins.insert(GuildId::from(guild.as_str()), channel_id);
                }
                Err(_) => warn!("Skipping pin for guild {}: bad channel id {:?}", guild, channel),
            }
        }
        pins
    }

    pub async fn set(&self, guild_id: &GuildId, channel_id: ChannelId) -> Result<(), PersistError> {
        let mut records = self.loaded_records().await;
        let previous = records.insert(guild_id.to_string(), channel_id.to_string());
        if previous.as_deref() == Some(channel_id.to_string().as_str()) {
            return Ok(());
        }
        self.write(&records).await
    }

    pub async fn remove(&self, guild_id: &GuildId) -> Result<(), PersistError> {
        let mut records = self.loaded_records().await;
        if records.remove(guild_id.0.as_str()).is_none() {
            return Ok(());
        }
        self.write(&records).await
    }

    pub async fn contains(&self, guild_id: &GuildId) -> bool {
        self.loaded_records().await.contains_key(guild_id.0.as_str())
    }

    async fn loaded_records(&self) -> MappedMutexGuard<'_, BTreeMap<String, String>> {
        let mut records = self.records.lock().await;
        if records.is_none() {
            *records = Some(self.read_file().await);
        }
        MutexGuard::map(records, |records| records.get_or_insert_with(BTreeMap::new))
    }

    /// Missing or unreadable files yield an empty record.
    async fn read_file(&self) -> BTreeMap<String, String> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No pin record at {}", self.path.display());
                return BTreeMap::new();
            }
            Err(e) => {
                warn!("Failed to read pin record {}: {}", self.path.display(), e);
                return BTreeMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Ignoring corrupt pin record {}: {}", self.path.display(), e);
                BTreeMap::new()
            }
        }
    }

    async fn write(&self, records: &BTreeMap<String, String>) -> Result<(), PersistError> {
        let body = serde_json::to_string_pretty(records)?;
        let mut backoff = Backoff::new(self.write_attempts);

        loop {
            match self.write_once(&body).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    let delay = backoff.next();
                    if backoff.is_exhausted() {
                        return Err(PersistError::Write {
                            path: self.path.display().to_string(),
                            attempts: backoff.attempt,
                            source: e,
                        });
                    }
                    warn!(
                        "Pin record write failed (attempt {}): {}. Retrying in {:?}",
                        backoff.attempt, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn write_once(&self, body: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> PinStore {
        PinStore::new(dir.path().join("data").join("stay247.json"), 3)
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store(&dir).load().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_set_and_remove_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.set(&GuildId::from("10"), ChannelId(100)).await.unwrap();
        store.set(&GuildId::from("20"), ChannelId(200)).await.unwrap();
        store.remove(&GuildId::from("10")).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let on_disk: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(on_disk, serde_json::json!({ "20": "200" }));

        let reloaded = PinStore::new(store.path(), 3).load().await;
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(&GuildId::from("20")), Some(&ChannelId(200)));
    }

    #[tokio::test]
    async fn test_set_before_load_keeps_persisted_pins() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{"1":"11","3":"33"}"#).unwrap();

        store.set(&GuildId::from("2"), ChannelId(22)).await.unwrap();

        assert_eq!(store.load().await.len(), 3);
        let reloaded = PinStore::new(store.path(), 3).load().await;
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.get(&GuildId::from("1")), Some(&ChannelId(11)));
        assert_eq!(reloaded.get(&GuildId::from("2")), Some(&ChannelId(22)));
    }

    #[tokio::test]
    async fn test_remove_before_load_keeps_other_pins() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{"1":"11","3":"33"}"#).unwrap();

        store.remove(&GuildId::from("1")).await.unwrap();

        let reloaded = PinStore::new(store.path(), 3).load().await;
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(&GuildId::from("3")), Some(&ChannelId(33)));
    }

    #[tokio::test]
    async fn test_load_sees_later_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        assert!(store.load().await.is_empty());

        store.set(&GuildId::from("5"), ChannelId(55)).await.unwrap();
        assert_eq!(store.load().await.get(&GuildId::from("5")), Some(&ChannelId(55)));
    }

    #[tokio::test]
    async fn test_bad_channel_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{"1":"11","2":"voice"}"#).unwrap();

        let pins = store.load().await;
        assert_eq!(pins.len(), 1);
        assert_eq!(pins.get(&GuildId::from("1")), Some(&ChannelId(11)));
    }

    #[tokio::test]
    async fn test_unwritable_path_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();
        let store = PinStore::new(blocker.join("stay247.json"), 2);

        let err = store.set(&GuildId::from("1"), ChannelId(1)).await.unwrap_err();
        assert!(matches!(err, PersistError::Write { attempts: 2, .. }));
        assert!(store.contains(&GuildId::from("1")).await);
    }

    #[test]
    fn test_backoff_doubles() {
        let mut backoff = Backoff::new(3);
        assert_eq!(backoff.next(), Duration::from_millis(50));
        assert_eq!(backoff.next(), Duration::from_millis(100));
        assert_eq!(backoff.next(), Duration::from_millis(200));
        assert!(backoff.is_exhausted());
    }
}
