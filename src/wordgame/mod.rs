//! Daily five-letter word guessing game

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub const WORD_LENGTH: usize = 5;
pub const MAX_GUESSES: usize = 6;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]{5}$").expect("valid regex"));

/// Default word list, programming flavoured
pub const WORDS: &[&str] = &[
    "array", "async", "await", "bytes", "cache", "catch", "class", "clone", "const", "crate",
    "debug", "defer", "deque", "enums", "error", "event", "false", "fetch", "field", "float",
    "frame", "graph", "guard", "index", "input", "lexer", "limit", "local", "macro", "match",
    "merge", "mutex", "nodes", "parse", "patch", "pixel", "print", "proxy", "query", "queue",
    "range", "react", "regex", "route", "scope", "serde", "shell", "slice", "stack", "state",
    "store", "style", "super", "swift", "table", "throw", "token", "trait", "tuple", "types",
    "union", "value", "while", "write", "yield",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterFeedback {
    Correct,
    Present,
    Absent,
}

impl LetterFeedback {
    pub fn symbol(&self) -> char {
        match self {
            Self::Correct => '🟩',
            Self::Present => '🟨',
            Self::Absent => '⬛',
        }
    }
}

/// Score a guess against the answer. Repeated letters are only marked
/// present as many times as they occur in the answer outside exact hits.
pub fn evaluate_guess(guess: &str, answer: &str) -> Vec<LetterFeedback> {
    let guess: Vec<char> = guess.chars().collect();
    let answer: Vec<char> = answer.chars().collect();
    let mut feedback = vec![LetterFeedback::Absent; guess.len()];
    let mut unmatched = Vec::with_capacity(answer.len());

    for (i, a) in answer.iter().enumerate() {
        if guess.get(i) == Some(a) {
            feedback[i] = LetterFeedback::Correct;
        } else {
            unmatched.push(*a);
        }
    }

    for (i, g) in guess.iter().enumerate() {
        if feedback[i] == LetterFeedback::Correct {
            continue;
        }
        if let Some(pos) = unmatched.iter().position(|a| a == g) {
            unmatched.swap_remove(pos);
            feedback[i] = LetterFeedback::Present;
        }
    }
    feedback
}

/// Word of the day for a day index
pub fn daily_word(words: &[&'static str], day: i64) -> Option<&'static str> {
    if words.is_empty() {
        return None;
    }
    words.get(day.rem_euclid(words.len() as i64) as usize).copied()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuessError {
    #[error("Guesses must be 5 letters (a-z)")]
    InvalidFormat,
    #[error("'{0}' is not in the word list")]
    UnknownWord(String),
    #[error("The game is over")]
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won,
    Lost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Guess {
    pub word: String,
    pub feedback: Vec<LetterFeedback>,
}

impl Guess {
    /// Emoji row, e.g. for sharing
    pub fn symbols(&self) -> String {
        self.feedback.iter().map(LetterFeedback::symbol).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Game {
    answer: String,
    words: Vec<&'static str>,
    guesses: Vec<Guess>,
}

impl Game {
    pub fn new(answer: &str, words: &[&'static str]) -> Self {
        Self { answer: answer.to_lowercase(), words: words.to_vec(), guesses: Vec::new() }
    }

    /// Today's game over the default word list
    pub fn daily(day: i64) -> Self {
        Self::new(daily_word(WORDS, day).unwrap_or("crate"), WORDS)
    }

    pub fn guesses(&self) -> &[Guess] {
        &self.guesses
    }

    pub fn remaining(&self) -> usize {
        MAX_GUESSES.saturating_sub(self.guesses.len())
    }

    pub fn status(&self) -> GameStatus {
        if self.guesses.last().is_some_and(|g| g.word == self.answer) {
            GameStatus::Won
        } else if self.guesses.len() >= MAX_GUESSES {
            GameStatus::Lost
        } else {
            GameStatus::InProgress
        }
    }

    /// Revealed once the game is over
    pub fn answer(&self) -> Option<&str> {
        (self.status() != GameStatus::InProgress).then_some(self.answer.as_str())
    }

    pub fn guess(&mut self, word: &str) -> Result<&Guess, GuessError> {
        if self.status() != GameStatus::InProgress {
            return Err(GuessError::GameOver);
        }
        let word = word.trim().to_lowercase();
        if !WORD_RE.is_match(&word) {
            return Err(GuessError::InvalidFormat);
        }
        if !self.words.contains(&word.as_str()) {
            return Err(GuessError::UnknownWord(word));
        }

        let feedback = evaluate_guess(&word, &self.answer);
        self.guesses.push(Guess { word, feedback });
        tracing::debug!("Guess {} of {}", self.guesses.len(), MAX_GUESSES);
        self.guesses.last().ok_or(GuessError::GameOver)
    }
}
