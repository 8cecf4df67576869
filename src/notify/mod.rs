//! Toast notifications

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use crate::progress::{LessonEvent, SaveOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub level: Level,
    pub message: String,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl Toast {
    const DEFAULT_TTL: Duration = Duration::from_secs(4);

    fn new(level: Level, message: impl Into<String>) -> Self {
        Self { level, message: message.into(), created_at: Instant::now(), ttl: Self::DEFAULT_TTL }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message).with_ttl(Duration::from_secs(8))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= self.ttl
    }

    /// Toast announcing a progress event, if it deserves one
    pub fn from_event(event: &LessonEvent) -> Option<Self> {
        match event {
            LessonEvent::Milestone { percent: 100, .. } | LessonEvent::BlockCompleted { .. } => None,
            LessonEvent::Milestone { percent, .. } => {
                Some(Self::success(format!("🎉 {}% of the lesson done. Keep going!", percent)))
            }
            LessonEvent::LessonCompleted { .. } => {
                Some(Self::success("🏆 Lesson complete! Great work.").with_ttl(Duration::from_secs(6)))
            }
            LessonEvent::ProgressSaved { outcome: SaveOutcome::LocalOnly, .. } => {
                Some(Self::warning("Saved on this device. Will sync when the server is reachable."))
            }
            LessonEvent::ProgressSaved { outcome: SaveOutcome::Failed, .. } => {
                Some(Self::error("Progress could not be saved."))
            }
            LessonEvent::ProgressSaved { .. } => None,
        }
    }
}

/// Visible toasts, oldest first
#[derive(Debug, Default)]
pub struct Notifications {
    toasts: VecDeque<Toast>,
}

impl Notifications {
    const MAX_VISIBLE: usize = 3;

    pub fn push(&mut self, toast: Toast) {
        tracing::debug!("Toast ({:?}): {}", toast.level, toast.message);
        self.toasts.push_back(toast);
        while self.toasts.len() > Self::MAX_VISIBLE {
            self.toasts.pop_front();
        }
    }

    pub fn push_event(&mut self, event: &LessonEvent) {
        if let Some(toast) = Toast::from_event(event) {
            self.push(toast);
        }
    }

    /// Drop expired toasts
    pub fn prune(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|t| !t.is_expired(now));
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milestones_and_completion_are_celebrated() {
        let half = LessonEvent::Milestone { lesson_id: "L".into(), percent: 50 };
        assert!(Toast::from_event(&half).unwrap().message.contains("50%"));

        let full = LessonEvent::Milestone { lesson_id: "L".into(), percent: 100 };
        assert_eq!(Toast::from_event(&full), None);

        let done = LessonEvent::LessonCompleted { lesson_id: "L".into() };
        assert_eq!(Toast::from_event(&done).unwrap().level, Level::Success);
    }

    #[test]
    fn local_only_save_warns() {
        let saved = LessonEvent::ProgressSaved { lesson_id: "L".into(), outcome: SaveOutcome::LocalOnly };
        assert_eq!(Toast::from_event(&saved).unwrap().level, Level::Warning);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_toasts_are_pruned() {
        let mut notifications = Notifications::default();
        notifications.push(Toast::info("short").with_ttl(Duration::from_secs(1)));
        notifications.push(Toast::info("long").with_ttl(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(2)).await;
        notifications.prune();
        assert_eq!(notifications.iter().count(), 1);
        assert_eq!(notifications.latest().unwrap().message, "long");
    }

    #[test]
    fn queue_is_bounded() {
        let mut notifications = Notifications::default();
        for i in 0..5 {
            notifications.push(Toast::info(format!("t{}", i)));
        }
        assert_eq!(notifications.iter().count(), 3);
        assert_eq!(notifications.iter().next().unwrap().message, "t2");
    }
}
