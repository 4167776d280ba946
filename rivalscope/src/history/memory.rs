//! Local history store used for offline runs
//!
//! Entries live in memory, newest first, capped per user. When opened with a
//! file, every change is written back to it as JSON so later runs see the
//! same history.

use super::{HistoryError, HistoryStore, StoreError};
use crate::auth::AuthProvider;
use crate::model::{CompetitorResult, HistoryEntry};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Default number of entries kept per user
pub const DEFAULT_HISTORY_CAP: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    user_id: String,
    entry: HistoryEntry,
}

/// History kept in memory, optionally mirrored to a JSON file
pub struct MemoryHistoryStore {
    auth: Arc<dyn AuthProvider>,
    entries: RwLock<Vec<StoredEntry>>,
    cap: usize,
    path: Option<PathBuf>,
}

impl MemoryHistoryStore {
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        Self::with_cap(auth, DEFAULT_HISTORY_CAP)
    }

    pub fn with_cap(auth: Arc<dyn AuthProvider>, cap: usize) -> Self {
        Self {
            auth,
            entries: RwLock::new(Vec::new()),
            cap: cap.max(1),
            path: None,
        }
    }

    /// Open a store backed by `path`. A missing file starts an empty history;
    /// a file that is not a history list is an error and is left untouched.
    pub fn open(
        auth: Arc<dyn AuthProvider>,
        cap: usize,
        path: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<Vec<StoredEntry>>(&contents).map_err(|e| {
                StoreError::Decode(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Local { path, source }),
        };
        debug!(path = %path.display(), entries = entries.len(), "Opened local history");

        Ok(Self {
            auth,
            entries: RwLock::new(entries),
            cap: cap.max(1),
            path: Some(path),
        })
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Total entries across all users
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Write all entries to the backing file through a temporary sibling
    async fn persist(&self, entries: &[StoredEntry]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let local = |source| StoreError::Local {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(local)?;
        }
        let json = serde_json::to_vec_pretty(entries).map_err(|e| StoreError::Decode(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await.map_err(local)?;
        tokio::fs::rename(&tmp, path).await.map_err(local)?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn save(
        &self,
        query: &str,
        results: &[CompetitorResult],
        recommendations: Option<&str>,
    ) -> Result<(), HistoryError> {
        let session = self.auth.current_user().await?;
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            query_text: query.to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            result_count: results.len() as u64,
            results: results.to_vec(),
            developer_recommendations: recommendations.map(str::to_string),
        };

        let mut entries = self.entries.write().await;
        entries.insert(
            0,
            StoredEntry {
                user_id: session.user_id.clone(),
                entry,
            },
        );

        // Drop this user's oldest entries beyond the cap
        let mut seen = 0;
        entries.retain(|stored| {
            if stored.user_id != session.user_id {
                return true;
            }
            seen += 1;
            seen <= self.cap
        });

        self.persist(&entries).await?;
        info!(user_id = %session.user_id, query, "Saved query to local history");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let session = self.auth.current_user().await?;
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|stored| stored.user_id == session.user_id)
            .map(|stored| stored.entry.clone())
            .collect())
    }

    async fn remove(&self, id: &str) -> Result<(), HistoryError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|stored| stored.entry.id != id);
        if entries.len() != before {
            self.persist(&entries).await?;
        }
        Ok(())
    }
}
