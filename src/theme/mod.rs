//! Colour themes and the dark/light preference

mod palette;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

use crate::config::LocalStore;

/// Local storage key of the theme preference
pub const THEME_KEY: &str = "cwm_theme";

/// Dark or light
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn theme(&self) -> &'static Theme {
        match self {
            Self::Dark => &palette::NIGHT,
            Self::Light => &palette::DAY,
        }
    }

    /// Read the stored preference. Unknown values fall back to dark.
    pub fn load(store: &LocalStore) -> Self {
        store.get_item(THEME_KEY).and_then(|s| s.parse().ok()).unwrap_or_default()
    }

    pub fn save(&self, store: &LocalStore) -> Result<()> {
        store.set_item(THEME_KEY, self.as_str())
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_matches('"').to_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => Err(format!("Unknown theme: {}. Options: dark, light", other)),
        }
    }
}

/// A colour theme for the terminal player
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: &'static str,

    pub bg_primary: Color,
    pub bg_secondary: Color,
    pub bg_tertiary: Color,

    pub fg_primary: Color,
    pub fg_secondary: Color,
    pub fg_muted: Color,

    pub accent_primary: Color,
    pub accent_secondary: Color,

    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    pub syntax_keyword: Color,
    pub syntax_string: Color,
    pub syntax_number: Color,
    pub syntax_comment: Color,
    pub syntax_function: Color,
    pub syntax_type: Color,
    pub syntax_operator: Color,

    pub border: Color,
    pub border_focused: Color,
    pub selection: Color,

    /// Bundled syntect theme used for code
    pub syntect_theme: &'static str,
}

impl Default for Theme {
    fn default() -> Self {
        palette::NIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_is_tokyo_night() {
        assert_eq!(Theme::default().name, "Tokyo Night");
        assert_eq!(ThemeMode::Light.theme().name, "Tokyo Night Day");
    }

    #[test]
    fn preference_round_trips_through_storage() {
        let store = LocalStore::in_memory();
        assert_eq!(ThemeMode::load(&store), ThemeMode::Dark);

        ThemeMode::Light.save(&store).unwrap();
        assert_eq!(store.get_item(THEME_KEY).as_deref(), Some("light"));
        assert_eq!(ThemeMode::load(&store), ThemeMode::Light);
    }

    #[test]
    fn unknown_preference_falls_back_to_dark() {
        let store = LocalStore::in_memory();
        store.set_item(THEME_KEY, "sepia").unwrap();
        assert_eq!(ThemeMode::load(&store), ThemeMode::Dark);
        assert_eq!(ThemeMode::Dark.toggled(), ThemeMode::Light);
    }
}
