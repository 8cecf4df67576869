//! Lesson progress tracking
//!
//! `ProgressStore` owns the progress record of the open lesson together with
//! the assessment policy that gates completion. All completions go through
//! [`ProgressStore::submit`], so a block only enters `completed_blocks` once
//! its evidence passed.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::time::Instant;

use super::events::{EventBus, EventReceiver, LessonEvent, crossed};
use super::persistence::{ProgressPersistence, SaveOutcome};
use super::record::ProgressRecord;
use crate::assessment::{
    AssessmentPolicy, AssessmentRequirement, AssessmentResult, BlockStatus, Evaluation, RuleTable,
};
use crate::lesson::Lesson;

/// Progress of the open lesson
pub struct ProgressStore {
    lesson: Arc<Lesson>,
    record: ProgressRecord,
    policy: AssessmentPolicy,
    persistence: ProgressPersistence,
    events: EventBus,
    /// Milestones already announced (or reached before this session)
    milestones: BTreeSet<u8>,
    dirty: bool,
    /// Bumped on every change, so a save only clears `dirty` for the state it wrote
    revision: u64,
    /// Attempts persisted before this session
    attempt_base: BTreeMap<String, u32>,
    /// Start of the time not yet added to `time_spent`
    active_since: Instant,
}

impl ProgressStore {
    /// Start tracking a lesson from an existing record
    pub fn new(
        lesson: Arc<Lesson>,
        mut record: ProgressRecord,
        table: RuleTable,
        persistence: ProgressPersistence,
    ) -> Self {
        record.retain_blocks(lesson.blocks.iter().map(|b| b.id.as_str()));
        record.recompute(lesson.total_blocks());

        let mut policy = AssessmentPolicy::for_lesson(&lesson, table);
        for block_id in &record.completed_blocks {
            policy.restore_completed(block_id);
        }

        let milestones = super::events::MILESTONES
            .into_iter()
            .filter(|m| record.progress >= *m)
            .collect();
        let attempt_base = record.assessment_attempts.clone();

        Self {
            lesson,
            record,
            policy,
            persistence,
            events: EventBus::default(),
            milestones,
            dirty: false,
            revision: 0,
            attempt_base,
            active_since: Instant::now(),
        }
    }

    /// Load saved progress for a lesson and start tracking it
    pub async fn load(lesson: Arc<Lesson>, table: RuleTable, persistence: ProgressPersistence) -> Self {
        let record = persistence.load(&lesson.id).await;
        tracing::info!(
            "Progress for {}: {} of {} blocks",
            lesson.id,
            record.completed_blocks.len(),
            lesson.total_blocks()
        );
        Self::new(lesson, record, table, persistence)
    }

    pub fn lesson(&self) -> &Arc<Lesson> {
        &self.lesson
    }

    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    pub fn progress(&self) -> u8 {
        self.record.progress
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_block_completed(&self, block_id: &str) -> bool {
        self.record.is_completed(block_id)
    }

    pub fn status(&self, block_id: &str) -> BlockStatus {
        self.policy.status(block_id)
    }

    pub fn requirement(&self, block_id: &str) -> Option<&AssessmentRequirement> {
        self.policy.requirement(block_id)
    }

    /// Receive progress events
    pub fn subscribe(&mut self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Mark a block complete. Returns whether the block is complete afterwards.
    pub fn mark_block_complete(&mut self, block_id: &str, result: Option<&AssessmentResult>) -> bool {
        self.submit(block_id, result).accepted
    }

    /// Try to complete a block and report the evaluation
    pub fn submit(&mut self, block_id: &str, result: Option<&AssessmentResult>) -> Evaluation {
        if self.record.is_completed(block_id) {
            return Evaluation {
                accepted: true,
                feedback: "Already completed.".to_string(),
                attempts: self.policy.requirement(block_id).map_or(0, |r| r.attempts),
                attempts_remaining: None,
                exhausted: false,
                score: self.record.assessment_scores.get(block_id).copied(),
            };
        }

        let Some(requires_assessment) =
            self.policy.requirement(block_id).map(|r| r.requires_assessment)
        else {
            tracing::warn!("Ignoring completion of unknown block {}", block_id);
            return Evaluation::rejected(format!("Unknown block '{}'", block_id));
        };

        let evaluation = match result {
            Some(result) => self.policy.evaluate(block_id, result),
            None if !requires_assessment => {
                self.policy.mark_without_assessment(block_id);
                Evaluation {
                    accepted: true,
                    feedback: "Marked as complete.".to_string(),
                    attempts: 0,
                    attempts_remaining: None,
                    exhausted: false,
                    score: None,
                }
            }
            None => {
                return Evaluation::rejected("Complete the assessment to finish this block.");
            }
        };

        if let Some(requirement) = self.policy.requirement(block_id) {
            if requirement.attempts > 0 {
                let base = self.attempt_base.get(block_id).copied().unwrap_or(0);
                self.record.record_attempts(block_id, base + requirement.attempts);
                self.mark_dirty();
            }
        }
        if let Some(score) = evaluation.score {
            self.record.record_score(block_id, score);
        }

        if evaluation.accepted {
            self.complete(block_id);
        }
        evaluation
    }

    fn complete(&mut self, block_id: &str) {
        let before = self.record.progress;
        self.record.completed_blocks.insert(block_id.to_string());
        self.record.recompute(self.lesson.total_blocks());
        self.record.touch();
        self.mark_dirty();

        let lesson_id = self.lesson.id.clone();
        let after = self.record.progress;
        tracing::info!("Completed block {} of {} ({}%)", block_id, lesson_id, after);

        self.events.emit(LessonEvent::BlockCompleted {
            lesson_id: lesson_id.clone(),
            block_id: block_id.to_string(),
            progress: after,
        });

        for percent in crossed(before, after).collect::<Vec<_>>() {
            if self.milestones.insert(percent) {
                self.events.emit(LessonEvent::Milestone { lesson_id: lesson_id.clone(), percent });
            }
        }

        if self.record.completed {
            self.events.emit(LessonEvent::LessonCompleted { lesson_id });
        }
    }

    /// Fold elapsed time into `time_spent`
    fn accumulate_time(&mut self) {
        let elapsed = self.active_since.elapsed();
        let secs = elapsed.as_secs();
        if secs > 0 {
            self.record.time_spent += secs;
            self.active_since += std::time::Duration::from_secs(secs);
            self.mark_dirty();
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    /// Snapshot the record for a save that runs without borrowing the store
    pub fn begin_save(&mut self) -> SaveJob {
        self.accumulate_time();
        SaveJob {
            lesson_id: self.lesson.id.clone(),
            record: self.record.clone(),
            persistence: self.persistence.clone(),
            revision: self.revision,
        }
    }

    /// Apply the outcome of a [`SaveJob`]. The dirty flag is cleared only by a
    /// durable write of the latest revision.
    pub fn finish_save(&mut self, revision: u64, outcome: SaveOutcome) {
        if outcome.is_durable() && revision == self.revision {
            self.dirty = false;
        }
        self.events.emit(LessonEvent::ProgressSaved { lesson_id: self.lesson.id.clone(), outcome });
    }

    /// Persist the record
    pub async fn save(&mut self) -> SaveOutcome {
        let job = self.begin_save();
        let (revision, outcome) = job.run().await;
        self.finish_save(revision, outcome);
        outcome
    }

    /// Save only if something changed
    pub async fn save_if_dirty(&mut self) -> Option<SaveOutcome> {
        if self.dirty { Some(self.save().await) } else { None }
    }
}

/// A record snapshot on its way to persistence
pub struct SaveJob {
    lesson_id: String,
    record: ProgressRecord,
    persistence: ProgressPersistence,
    revision: u64,
}

impl SaveJob {
    /// Write the snapshot; returns the revision it was taken at
    pub async fn run(self) -> (u64, SaveOutcome) {
        let outcome = self.persistence.save(&self.lesson_id, &self.record).await;
        (self.revision, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::AssessmentKind;
    use crate::config::LocalStore;
    use crate::lesson::{Block, BlockKind, CodeExample, Difficulty, InteractiveExercise, QuizBlock, TestCase, TextBlock};
    use crate::progress::persistence::tests::FakeRemote;
    use std::sync::atomic::Ordering;

    fn lesson() -> Arc<Lesson> {
        Arc::new(Lesson {
            id: "L1".into(),
            title: "Variables".into(),
            description: String::new(),
            difficulty: Difficulty::Beginner,
            blocks: vec![
                Block::new("intro", 0, BlockKind::Text(TextBlock::default())),
                Block::new("example", 1, BlockKind::CodeExample(CodeExample::default())),
                Block::new("quiz", 2, BlockKind::Quiz(QuizBlock { quiz_id: "Q1".into(), title: None })),
                Block::new(
                    "challenge",
                    3,
                    BlockKind::Interactive(InteractiveExercise {
                        tests: vec![TestCase::default()],
                        ..Default::default()
                    }),
                ),
            ],
        })
    }

    fn store_with(remote: Arc<FakeRemote>) -> ProgressStore {
        let persistence = ProgressPersistence::new(Some(remote), Arc::new(LocalStore::in_memory()));
        ProgressStore::new(lesson(), ProgressRecord::default(), RuleTable::default(), persistence)
    }

    fn store() -> ProgressStore {
        store_with(Arc::new(FakeRemote::default()))
    }

    #[tokio::test]
    async fn failing_quiz_leaves_progress_unchanged() {
        let mut store = store();
        assert!(store.mark_block_complete("intro", None));
        assert!(store.mark_block_complete("example", None));
        assert_eq!(store.progress(), 50);

        assert!(!store.mark_block_complete("quiz", Some(&AssessmentResult::Quiz { score: 40.0 })));
        assert_eq!(store.progress(), 50);
        assert!(!store.is_block_completed("quiz"));
        assert_eq!(store.status("quiz"), BlockStatus::InProgress);
    }

    #[tokio::test]
    async fn completion_is_idempotent() {
        let remote = Arc::new(FakeRemote::default());
        let mut store = store_with(remote.clone());

        assert!(store.mark_block_complete("intro", None));
        assert_eq!(store.save_if_dirty().await, Some(SaveOutcome::Synced));
        assert_eq!(remote.saves.load(Ordering::SeqCst), 1);

        assert!(store.mark_block_complete("intro", None));
        assert!(!store.is_dirty());
        assert_eq!(store.record().completed_blocks.len(), 1);
    }

    #[tokio::test]
    async fn assessed_block_needs_evidence() {
        let mut store = store();
        assert!(!store.mark_block_complete("quiz", None));
        assert!(!store.mark_block_complete("missing", None));
        assert!(store.mark_block_complete("quiz", Some(&AssessmentResult::Quiz { score: 70.0 })));
        assert_eq!(store.record().assessment_scores["quiz"], 70.0);
        assert_eq!(store.record().assessment_attempts["quiz"], 1);
    }

    #[tokio::test]
    async fn milestones_fire_once() {
        let mut store = store();
        let mut events = store.subscribe();

        store.mark_block_complete("intro", None);
        store.mark_block_complete("example", None);
        store.mark_block_complete("quiz", Some(&AssessmentResult::Quiz { score: 90.0 }));
        store.mark_block_complete("challenge", Some(&AssessmentResult::Tests { passed: 5, total: 5 }));

        let mut milestones = Vec::new();
        let mut completed = 0;
        while let Ok(event) = events.try_recv() {
            match event {
                LessonEvent::Milestone { percent, .. } => milestones.push(percent),
                LessonEvent::LessonCompleted { .. } => completed += 1,
                _ => {}
            }
        }
        assert_eq!(milestones, vec![25, 50, 75, 100]);
        assert_eq!(completed, 1);
    }

    #[tokio::test]
    async fn restored_record_seeds_policy_and_milestones() {
        let record = ProgressRecord {
            completed_blocks: ["intro", "example", "stale"].iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        let persistence = ProgressPersistence::local_only(Arc::new(LocalStore::in_memory()));
        let mut store = ProgressStore::new(lesson(), record, RuleTable::default(), persistence);
        let mut events = store.subscribe();

        assert_eq!(store.progress(), 50);
        assert_eq!(store.status("intro"), BlockStatus::Completed);

        store.mark_block_complete("quiz", Some(&AssessmentResult::Quiz { score: 100.0 }));
        let milestones: Vec<u8> = std::iter::from_fn(|| events.try_recv().ok())
            .filter_map(|e| match e {
                LessonEvent::Milestone { percent, .. } => Some(percent),
                _ => None,
            })
            .collect();
        assert_eq!(milestones, vec![75]);
    }

    #[tokio::test]
    async fn failed_remote_save_stays_dirty() {
        let remote = Arc::new(FakeRemote::default());
        remote.offline.store(true, Ordering::SeqCst);
        let mut store = store_with(remote.clone());

        store.mark_block_complete("intro", None);
        assert_eq!(store.save().await, SaveOutcome::LocalOnly);
        assert!(store.is_dirty());

        remote.offline.store(false, Ordering::SeqCst);
        assert_eq!(store.save_if_dirty().await, Some(SaveOutcome::Synced));
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn save_and_reload_keeps_completed_blocks() {
        let remote = Arc::new(FakeRemote::default());
        let local = Arc::new(LocalStore::in_memory());
        let persistence = ProgressPersistence::new(Some(remote.clone()), local.clone());

        let mut store =
            ProgressStore::new(lesson(), ProgressRecord::default(), RuleTable::default(), persistence.clone());
        store.mark_block_complete("intro", None);
        store.mark_block_complete("quiz", Some(&AssessmentResult::Quiz { score: 80.0 }));
        store.save().await;

        let reloaded = ProgressStore::load(lesson(), RuleTable::default(), persistence).await;
        assert_eq!(reloaded.record().completed_blocks, store.record().completed_blocks);
        assert_eq!(reloaded.progress(), 50);
    }

    #[tokio::test]
    async fn attempts_keep_counting_after_reload() {
        let local = Arc::new(LocalStore::in_memory());
        let persistence = ProgressPersistence::local_only(local);
        let failing = AssessmentResult::Quiz { score: 10.0 };

        let mut store =
            ProgressStore::new(lesson(), ProgressRecord::default(), RuleTable::default(), persistence.clone());
        for _ in 0..3 {
            assert!(!store.mark_block_complete("quiz", Some(&failing)));
        }
        store.save().await;

        let mut reloaded = ProgressStore::load(lesson(), RuleTable::default(), persistence.clone()).await;
        assert_eq!(reloaded.record().assessment_attempts["quiz"], 3);
        assert!(!reloaded.mark_block_complete("quiz", Some(&failing)));
        reloaded.save().await;

        let saved = persistence.load_local("L1").unwrap();
        assert_eq!(saved.assessment_attempts["quiz"], 4);
    }

    #[tokio::test]
    async fn change_during_save_keeps_store_dirty() {
        let mut store = store();
        store.mark_block_complete("intro", None);
        let job = store.begin_save();
        store.mark_block_complete("example", None);

        let (revision, outcome) = job.run().await;
        store.finish_save(revision, outcome);
        assert_eq!(outcome, SaveOutcome::Synced);
        assert!(store.is_dirty());

        store.save().await;
        assert!(!store.is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn time_on_page_accumulates_on_save() {
        let mut store = store();
        tokio::time::advance(std::time::Duration::from_secs(42)).await;
        store.save().await;
        assert_eq!(store.record().time_spent, 42);
    }

    #[tokio::test]
    async fn attempt_override_exhausts_challenge() {
        let remote = Arc::new(FakeRemote::default());
        let persistence = ProgressPersistence::new(Some(remote), Arc::new(LocalStore::in_memory()));
        let table = RuleTable::default().with_max_attempts(AssessmentKind::CodeChallenge, 3);
        let mut store = ProgressStore::new(lesson(), ProgressRecord::default(), table, persistence);

        let failing = AssessmentResult::Tests { passed: 0, total: 4 };
        for _ in 0..3 {
            assert!(!store.mark_block_complete("challenge", Some(&failing)));
        }
        let passing = AssessmentResult::Tests { passed: 4, total: 4 };
        assert!(!store.mark_block_complete("challenge", Some(&passing)));
        assert_eq!(store.status("challenge"), BlockStatus::Exhausted);
    }
}
