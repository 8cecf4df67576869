//! Lesson progress events

use tokio::sync::mpsc;

use super::persistence::SaveOutcome;

/// Progress milestones, in percent
pub const MILESTONES: [u8; 4] = [25, 50, 75, 100];

/// Something happened to a lesson's progress
#[derive(Debug, Clone, PartialEq)]
pub enum LessonEvent {
    BlockCompleted { lesson_id: String, block_id: String, progress: u8 },
    /// A milestone reached for the first time this session
    Milestone { lesson_id: String, percent: u8 },
    LessonCompleted { lesson_id: String },
    ProgressSaved { lesson_id: String, outcome: SaveOutcome },
}

pub type EventSender = mpsc::UnboundedSender<LessonEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<LessonEvent>;

/// Fan-out to any number of subscribers. Closed receivers are dropped.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<EventSender>,
}

impl EventBus {
    pub fn subscribe(&mut self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: LessonEvent) {
        tracing::debug!("Event: {:?}", event);
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Milestones newly crossed when progress moves from `before` to `after`
pub fn crossed(before: u8, after: u8) -> impl Iterator<Item = u8> {
    MILESTONES.into_iter().filter(move |m| before < *m && after >= *m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_reports_each_threshold() {
        assert_eq!(crossed(0, 50).collect::<Vec<_>>(), vec![25, 50]);
        assert_eq!(crossed(50, 67).collect::<Vec<_>>(), Vec::<u8>::new());
        assert_eq!(crossed(67, 100).collect::<Vec<_>>(), vec![75, 100]);
    }

    #[test]
    fn closed_subscribers_are_dropped() {
        let mut bus = EventBus::default();
        let rx = bus.subscribe();
        let mut live = bus.subscribe();
        drop(rx);

        bus.emit(LessonEvent::LessonCompleted { lesson_id: "L".into() });
        assert_eq!(bus.subscriber_count(), 1);
        assert!(live.try_recv().is_ok());
    }
}
