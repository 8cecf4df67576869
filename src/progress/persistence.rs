//! Two-tier progress persistence
//!
//! The remote API is the primary copy; local storage is a mirror that is
//! always written and is consulted on load. When both tiers hold a record
//! the newer `last_updated` wins. Concurrent writers in other processes are
//! not coordinated: the last write wins.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::record::ProgressRecord;
use crate::api::ApiError;
use crate::config::LocalStore;

/// Remote progress storage
pub trait ProgressRemote: Send + Sync {
    /// Load the stored record; `Ok(None)` when the server has none
    fn load<'a>(&'a self, lesson_id: &'a str)
    -> BoxFuture<'a, Result<Option<ProgressRecord>, ApiError>>;

    /// Store a record
    fn save<'a>(
        &'a self,
        lesson_id: &'a str,
        record: &'a ProgressRecord,
    ) -> BoxFuture<'a, Result<(), ApiError>>;
}

/// Local storage key for a lesson's progress
pub fn local_key(lesson_id: &str) -> String {
    format!("lesson_{}_progress", lesson_id)
}

/// Where a save landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written to the server (and mirrored locally when possible)
    Synced,
    /// No remote configured; written locally
    Offline,
    /// Remote write failed; only the local mirror was written
    LocalOnly,
    /// Neither tier accepted the record
    Failed,
}

impl SaveOutcome {
    /// Whether the record is stored in its authoritative tier
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Synced | Self::Offline)
    }
}

/// Remote plus local progress storage
#[derive(Clone)]
pub struct ProgressPersistence {
    remote: Option<Arc<dyn ProgressRemote>>,
    local: Arc<LocalStore>,
}

impl ProgressPersistence {
    pub fn new(remote: Option<Arc<dyn ProgressRemote>>, local: Arc<LocalStore>) -> Self {
        Self { remote, local }
    }

    /// Local-only persistence
    pub fn local_only(local: Arc<LocalStore>) -> Self {
        Self::new(None, local)
    }

    /// The local tier
    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Read the local mirror. Corrupted entries are treated as absent.
    pub fn load_local(&self, lesson_id: &str) -> Option<ProgressRecord> {
        match self.local.get_json::<ProgressRecord>(&local_key(lesson_id)) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Ignoring local progress for {}: {}", lesson_id, e);
                None
            }
        }
    }

    /// Load the newest record from either tier, or an empty one
    pub async fn load(&self, lesson_id: &str) -> ProgressRecord {
        let remote = match &self.remote {
            Some(remote) => match remote.load(lesson_id).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("Could not load remote progress for {}: {}", lesson_id, e);
                    None
                }
            },
            None => None,
        };
        let local = self.load_local(lesson_id);

        match (remote, local) {
            (Some(remote), Some(local)) if local.last_updated > remote.last_updated => {
                tracing::debug!("Local progress for {} is newer than the server copy", lesson_id);
                local
            }
            (Some(remote), _) => remote,
            (None, Some(local)) => local,
            (None, None) => ProgressRecord::default(),
        }
    }

    /// Mirror locally, then write remotely
    pub async fn save(&self, lesson_id: &str, record: &ProgressRecord) -> SaveOutcome {
        let local_ok = match self.local.set_json(&local_key(lesson_id), record) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Could not mirror progress for {} locally: {:#}", lesson_id, e);
                false
            }
        };

        let Some(remote) = &self.remote else {
            return if local_ok { SaveOutcome::Offline } else { SaveOutcome::Failed };
        };

        match remote.save(lesson_id, record).await {
            Ok(()) => {
                tracing::info!("Saved progress for {} ({}%)", lesson_id, record.progress);
                SaveOutcome::Synced
            }
            Err(e) if local_ok => {
                tracing::warn!("Progress for {} kept locally, server write failed: {}", lesson_id, e);
                SaveOutcome::LocalOnly
            }
            Err(e) => {
                tracing::error!("Progress for {} could not be saved: {}", lesson_id, e);
                SaveOutcome::Failed
            }
        }
    }
}
