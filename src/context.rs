//! Application context shared by the CLI and the player

use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::api::{ApiClient, TokenStore, UserProfile};
use crate::assessment::RuleTable;
use crate::config::{Config, LocalStore};
use crate::lesson::LessonFetcher;
use crate::progress::ProgressPersistence;
use crate::theme::ThemeMode;

/// Local storage keys that may hold the signed-in user's profile
pub const PROFILE_KEYS: [&str; 2] = ["cwm_user_profile", "currentUser"];

/// Everything a command needs
pub struct AppContext {
    pub config: Config,
    pub store: Arc<LocalStore>,
    pub client: ApiClient,
    pub current_user: Option<UserProfile>,
    pub theme: ThemeMode,
    /// Work without the server
    pub offline: bool,
}

impl AppContext {
    /// Build the context from the config and local storage on disk
    pub fn load(offline: bool) -> Result<Self> {
        let config = Config::load()?;
        let store = Arc::new(LocalStore::open_default()?);
        Self::from_parts(config, store, offline)
    }

    pub fn from_parts(config: Config, store: Arc<LocalStore>, offline: bool) -> Result<Self> {
        let token = if offline { None } else { TokenStore::resolve(&store) };
        if let Some(token) = &token {
            tracing::debug!("Using token {}", TokenStore::mask(token));
        }

        let client = ApiClient::new(&config.api_base_url, token).context("Failed to create API client")?;
        let current_user = Self::read_profile(&store);
        let theme = ThemeMode::load(&store);

        Ok(Self { config, store, client, current_user, theme, offline })
    }

    /// First readable profile under the known keys
    fn read_profile(store: &LocalStore) -> Option<UserProfile> {
        PROFILE_KEYS.iter().find_map(|key| match store.get_json::<UserProfile>(key) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Ignoring stored profile: {}", e);
                None
            }
        })
    }

    pub fn display_name(&self) -> &str {
        self.current_user.as_ref().map_or("learner", UserProfile::display_name)
    }

    pub fn rule_table(&self) -> RuleTable {
        RuleTable::new(self.config.difficulty)
    }

    pub fn fetcher(&self) -> LessonFetcher {
        if self.offline {
            LessonFetcher::offline()
        } else {
            LessonFetcher::new(Arc::new(self.client.clone()))
        }
    }

    pub fn persistence(&self) -> ProgressPersistence {
        if self.offline {
            ProgressPersistence::local_only(self.store.clone())
        } else {
            ProgressPersistence::new(Some(Arc::new(self.client.clone())), self.store.clone())
        }
    }

    /// Switch theme and remember the choice
    pub fn set_theme(&mut self, theme: ThemeMode) -> Result<()> {
        self.theme = theme;
        theme.save(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(store: LocalStore) -> AppContext {
        AppContext::from_parts(Config::default(), Arc::new(store), true).unwrap()
    }

    #[test]
    fn profile_falls_back_to_legacy_key() {
        let store = LocalStore::in_memory();
        store.set_json("currentUser", &json!({ "id": "u1", "name": "Ana" })).unwrap();

        let ctx = context(store);
        assert_eq!(ctx.display_name(), "Ana");
    }

    #[test]
    fn corrupted_profile_is_ignored() {
        let store = LocalStore::in_memory();
        store.set_item("cwm_user_profile", "not json").unwrap();
        assert_eq!(context(store).display_name(), "learner");
    }

    #[test]
    fn offline_context_has_no_token() {
        let store = LocalStore::in_memory();
        store.set_item("auth_token", "secret").unwrap();
        assert!(!context(store).client.is_authenticated());
    }

    #[test]
    fn theme_choice_is_persisted() {
        let mut ctx = context(LocalStore::in_memory());
        ctx.set_theme(ThemeMode::Light).unwrap();
        assert_eq!(ThemeMode::load(&ctx.store), ThemeMode::Light);
    }
}
