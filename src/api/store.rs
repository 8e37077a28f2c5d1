use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::OptInRecord;
use crate::error::{PerksError, Result};

/// Opt-in records, optionally persisted as a JSON array
pub struct PreferenceStore {
    path: Option<PathBuf>,
    records: Mutex<Vec<OptInRecord>>,
}

impl PreferenceStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Load existing records from `path`; a missing file starts empty
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => Vec::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preferences file at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path),
            records: Mutex::new(records),
        })
    }

    /// One record per wallet and campaign
    pub async fn insert(&self, record: OptInRecord) -> Result<()> {
        let mut records = self.records.lock().await;
        if records
            .iter()
            .any(|r| r.same_participant(&record.wallet_address, record.campaign_id))
        {
            return Err(PerksError::Duplicate(
                "Preferences already saved for this campaign".into(),
            ));
        }
        records.push(record);

        if let Some(path) = &self.path {
            if let Err(e) = persist(path, &records).await {
                warn!("Failed to persist preferences: {}", e);
                records.pop();
                return Err(e);
            }
        }
        Ok(())
    }

    pub async fn has_shared(&self, wallet_address: &str, campaign_id: u64) -> bool {
        self.records
            .lock()
            .await
            .iter()
            .any(|r| r.same_participant(wallet_address, campaign_id))
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

async fn persist(path: &Path, records: &[OptInRecord]) -> Result<()> {
    let payload = serde_json::to_vec_pretty(records)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(wallet: &str, campaign_id: u64) -> OptInRecord {
        OptInRecord::new(wallet, campaign_id, "holder@example.com")
    }

    #[tokio::test]
    async fn rejects_second_opt_in_for_same_campaign() {
        let store = PreferenceStore::in_memory();
        store.insert(record("0xAbC", 1)).await.unwrap();

        let err = store.insert(record("0xabc", 1)).await.unwrap_err();
        assert!(matches!(err, PerksError::Duplicate(_)));

        store.insert(record("0xabc", 2)).await.unwrap();
        assert_eq!(store.len().await, 2);
        assert!(store.has_shared("0xABC", 1).await);
        assert!(!store.has_shared("0xabc", 3).await);
    }

    #[tokio::test]
    async fn reloads_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "proofperks-prefs-{}-{}.json",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));

        let store = PreferenceStore::open(&path).await.unwrap();
        assert!(store.is_empty().await);
        store.insert(record("0xabc", 4)).await.unwrap();

        let reopened = PreferenceStore::open(&path).await.unwrap();
        assert!(reopened.has_shared("0xabc", 4).await);

        let _ = tokio::fs::remove_file(&path).await;
    }
}
