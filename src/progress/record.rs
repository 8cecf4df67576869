//! Per-lesson progress record

use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Current time as unix milliseconds
pub fn now_millis() -> i64 {
    SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).map_or(0, |d| d.as_millis() as i64)
}

/// Percentage of `completed` out of `total`, rounded to the nearest integer
pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (completed as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Progress of one user through one lesson.
///
/// The serialized form is the body of `POST /api/lessons/{id}/progress`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Overall completion percentage (derived from `completed_blocks`)
    #[serde(default)]
    pub progress: u8,

    /// Whether every block is complete (derived)
    #[serde(default)]
    pub completed: bool,

    /// Ids of completed blocks
    #[serde(default)]
    pub completed_blocks: BTreeSet<String>,

    /// Seconds spent on the lesson across sessions
    #[serde(default)]
    pub time_spent: u64,

    /// Unix milliseconds of the last change
    #[serde(default)]
    pub last_updated: i64,

    /// Best assessment score per block (percent)
    #[serde(default)]
    pub assessment_scores: BTreeMap<String, f64>,

    /// Assessment attempts per block
    #[serde(default)]
    pub assessment_attempts: BTreeMap<String, u32>,
}

impl ProgressRecord {
    /// Whether a block is complete
    pub fn is_completed(&self, block_id: &str) -> bool {
        self.completed_blocks.contains(block_id)
    }

    /// Recompute the derived fields for a lesson of `total_blocks` blocks
    pub fn recompute(&mut self, total_blocks: usize) {
        self.progress = percentage(self.completed_blocks.len(), total_blocks);
        self.completed = total_blocks > 0 && self.completed_blocks.len() >= total_blocks;
    }

    /// Drop ids that are not blocks of the current lesson (stale server data)
    pub fn retain_blocks<'a>(&mut self, valid: impl IntoIterator<Item = &'a str>) {
        let valid: BTreeSet<&str> = valid.into_iter().collect();
        let before = self.completed_blocks.len();
        self.completed_blocks.retain(|id| valid.contains(id.as_str()));
        if self.completed_blocks.len() != before {
            tracing::debug!(
                "Dropped {} stale completed block ids",
                before - self.completed_blocks.len()
            );
        }
    }

    /// Keep the higher of the stored and new score
    pub fn record_score(&mut self, block_id: &str, score: f64) {
        let entry = self.assessment_scores.entry(block_id.to_string()).or_insert(score);
        if score > *entry {
            *entry = score;
        }
    }

    /// Remember the attempt count for a block. Counts never go down.
    pub fn record_attempts(&mut self, block_id: &str, attempts: u32) {
        if attempts > 0 {
            let entry = self.assessment_attempts.entry(block_id.to_string()).or_insert(0);
            *entry = (*entry).max(attempts);
        }
    }

    /// Touch `last_updated`
    pub fn touch(&mut self) {
        self.last_updated = now_millis();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(2, 4), 50);
        assert_eq!(percentage(4, 4), 100);
    }

    #[test]
    fn recompute_sets_completed_flag() {
        let mut record = ProgressRecord::default();
        record.completed_blocks.insert("a".into());
        record.completed_blocks.insert("b".into());

        record.recompute(2);
        assert_eq!(record.progress, 100);
        assert!(record.completed);

        record.recompute(4);
        assert_eq!(record.progress, 50);
        assert!(!record.completed);
    }

    #[test]
    fn retain_blocks_drops_unknown_ids() {
        let mut record = ProgressRecord::default();
        record.completed_blocks.insert("a".into());
        record.completed_blocks.insert("gone".into());

        record.retain_blocks(["a", "b"]);
        assert_eq!(record.completed_blocks.len(), 1);
        assert!(record.is_completed("a"));
    }

    #[test]
    fn record_score_keeps_best() {
        let mut record = ProgressRecord::default();
        record.record_score("quiz", 80.0);
        record.record_score("quiz", 60.0);
        assert_eq!(record.assessment_scores["quiz"], 80.0);
    }

    #[test]
    fn record_attempts_never_lowers_count() {
        let mut record = ProgressRecord::default();
        record.record_attempts("quiz", 3);
        record.record_attempts("quiz", 1);
        assert_eq!(record.assessment_attempts["quiz"], 3);
    }

    #[test]
    fn deserializes_partial_payload() {
        let json = r#"{"completed_blocks":["L1-intro"],"time_spent":42}"#;
        let record: ProgressRecord = serde_json::from_str(json).unwrap();
        assert!(record.is_completed("L1-intro"));
        assert_eq!(record.time_spent, 42);
        assert!(record.assessment_scores.is_empty());
    }

    proptest! {
        #[test]
        fn percentage_matches_rounded_ratio(total in 1usize..500, done in 0usize..500) {
            let done = done.min(total);
            let expected = ((done as f64 / total as f64) * 100.0).round() as u8;
            prop_assert_eq!(percentage(done, total), expected);
            prop_assert!(percentage(done, total) <= 100);
        }
    }
}
