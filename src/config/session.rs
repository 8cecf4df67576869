//! Session state persistence
//!
//! Remembers which lesson was open and where the player was, so the lesson
//! player can resume where the learner left off.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::Config;

/// Player state for a specific lesson
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LessonSession {
    /// Index of the selected block in render order
    pub selected_block: usize,
    /// Scroll offset in the detail pane
    pub detail_scroll_offset: usize,
    /// Unsubmitted editor contents per interactive block
    #[serde(default)]
    pub editor_buffers: HashMap<String, String>,
}

/// All session state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    /// Most recently opened lesson ID (if any)
    pub current_lesson_id: Option<String>,
    /// Session state per lesson (key is lesson ID)
    pub lessons: HashMap<String, LessonSession>,
    /// Block list width percentage (20-60)
    #[serde(default = "default_block_list_width")]
    pub block_list_width_percent: u16,
}

fn default_block_list_width() -> u16 {
    35
}

impl Session {
    /// Load session from disk
    pub fn load() -> Result<Self> {
        let path = Self::session_path()?;

        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session from {:?}", path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse session.json")
        } else {
            Ok(Self::default())
        }
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::session_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize session")?;

        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write session to {:?}", path))?;

        Ok(())
    }

    fn session_path() -> Result<PathBuf> {
        Ok(Config::data_dir()?.join("session.json"))
    }

    /// Get or create session for a lesson
    pub fn lesson_mut(&mut self, lesson_id: &str) -> &mut LessonSession {
        self.lessons.entry(lesson_id.to_string()).or_default()
    }

    /// Get session for a lesson (if exists)
    pub fn lesson(&self, lesson_id: &str) -> Option<&LessonSession> {
        self.lessons.get(lesson_id)
    }
}
