//! Lesson progress: record, tracking, persistence and autosave

pub mod autosave;
pub mod events;
pub mod persistence;
pub mod record;
pub mod store;

pub use autosave::{Autosaver, SharedStore, save_shared, save_shared_if_dirty, spawn_save};
pub use events::{EventReceiver, LessonEvent};
pub use persistence::{ProgressPersistence, ProgressRemote, SaveOutcome, local_key};
pub use record::{ProgressRecord, percentage};
pub use store::{ProgressStore, SaveJob};
