//! Periodic background saves

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::persistence::SaveOutcome;
use super::store::ProgressStore;

/// Shared handle to the open lesson's progress
pub type SharedStore = Arc<Mutex<ProgressStore>>;

/// Save without holding the lock while the record is written
pub async fn save_shared(store: &SharedStore) -> SaveOutcome {
    let job = store.lock().await.begin_save();
    let (revision, outcome) = job.run().await;
    store.lock().await.finish_save(revision, outcome);
    outcome
}

/// [`save_shared`] when the store has unsaved changes
pub async fn save_shared_if_dirty(store: &SharedStore) -> Option<SaveOutcome> {
    let job = {
        let mut guard = store.lock().await;
        if !guard.is_dirty() {
            return None;
        }
        guard.begin_save()
    };
    let (revision, outcome) = job.run().await;
    store.lock().await.finish_save(revision, outcome);
    Some(outcome)
}

/// Save in a background task
pub fn spawn_save(store: SharedStore) -> JoinHandle<SaveOutcome> {
    tokio::spawn(async move { save_shared(&store).await })
}

/// Background task saving the store while it is dirty
pub struct Autosaver {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Autosaver {
    /// Start saving every `period`
    pub fn spawn(store: SharedStore, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        save_shared_if_dirty(&store).await;
                    }
                }
            }

            // Unload: one last best-effort flush
            let outcome = save_shared_if_dirty(&store).await;
            tracing::debug!("Autosaver stopped, final flush: {:?}", outcome);
        });

        Self { cancel, handle }
    }

    /// Token that stops the task when cancelled
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel and wait for the final flush
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::error!("Autosave task failed: {}", e);
        }
    }
}
