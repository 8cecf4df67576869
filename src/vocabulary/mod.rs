//! Vocabulary flashcards with a daily practice streak

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::LocalStore;

pub const PROGRESS_KEY: &str = "vocabularyProgress";
pub const STREAK_KEY: &str = "vocabularyStreak";

/// Days since the unix epoch
pub fn day_index(unix_seconds: i64) -> i64 {
    unix_seconds.div_euclid(86_400)
}

pub fn today() -> i64 {
    day_index(crate::progress::record::now_millis() / 1000)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: String,
    pub term: String,
    pub translation: String,
    #[serde(default)]
    pub example: Option<String>,
}

/// A deck with a cursor over its cards
#[derive(Debug, Clone, Default)]
pub struct FlashcardDeck {
    cards: Vec<Flashcard>,
    position: usize,
    flipped: bool,
}

impl FlashcardDeck {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        Self { cards, position: 0, flipped: false }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current(&self) -> Option<&Flashcard> {
        self.cards.get(self.position)
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Show the other side of the current card
    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    /// Move forward, wrapping at the end
    pub fn next(&mut self) {
        if !self.cards.is_empty() {
            self.position = (self.position + 1) % self.cards.len();
            self.flipped = false;
        }
    }

    /// Move back, wrapping at the start
    pub fn previous(&mut self) {
        if !self.cards.is_empty() {
            self.position = (self.position + self.cards.len() - 1) % self.cards.len();
            self.flipped = false;
        }
    }

    /// Restrict to cards not yet known
    pub fn due(&self, progress: &VocabularyProgress) -> Vec<&Flashcard> {
        self.cards.iter().filter(|c| !progress.known.contains(&c.id)).collect()
    }
}

/// Which cards the learner knows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyProgress {
    pub known: BTreeSet<String>,
    pub review: BTreeSet<String>,
    pub review_counts: BTreeMap<String, u32>,
}

impl VocabularyProgress {
    pub fn load(store: &LocalStore) -> Self {
        store.get_json::<Self>(PROGRESS_KEY).unwrap_or_else(|e| {
            tracing::warn!("Resetting vocabulary progress: {}", e);
            None
        })
        .unwrap_or_default()
    }

    pub fn save(&self, store: &LocalStore) -> Result<()> {
        store.set_json(PROGRESS_KEY, self)
    }

    pub fn mark_known(&mut self, card_id: &str) {
        self.review.remove(card_id);
        self.known.insert(card_id.to_string());
        *self.review_counts.entry(card_id.to_string()).or_default() += 1;
    }

    pub fn mark_review(&mut self, card_id: &str) {
        self.known.remove(card_id);
        self.review.insert(card_id.to_string());
        *self.review_counts.entry(card_id.to_string()).or_default() += 1;
    }
}

/// Consecutive practice days
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyStreak {
    pub count: u32,
    /// Day index of the last practice
    pub last_day: Option<i64>,
}

impl VocabularyStreak {
    pub fn load(store: &LocalStore) -> Self {
        store.get_json::<Self>(STREAK_KEY).ok().flatten().unwrap_or_default()
    }

    pub fn save(&self, store: &LocalStore) -> Result<()> {
        store.set_json(STREAK_KEY, self)
    }

    /// Record practice on `day`
    pub fn record(&mut self, day: i64) {
        self.count = match self.last_day {
            Some(last) if last == day => self.count.max(1),
            Some(last) if last + 1 == day => self.count + 1,
            _ => 1,
        };
        self.last_day = Some(day);
    }

    /// Streak as of `day`: zero once a full day was missed
    pub fn current(&self, day: i64) -> u32 {
        match self.last_day {
            Some(last) if day - last <= 1 => self.count,
            _ => 0,
        }
    }
}
