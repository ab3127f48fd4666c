use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;
use crate::store::KvStore;

pub const USER_KEY: &str = "triadhub_user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Env,
    Config,
}

/// Sign-in state and the Gemini API key. The key is resolved once at
/// startup (environment wins over the config file); afterwards the only
/// way it changes is the user entering one in the key popup.
pub struct AuthState {
    store: KvStore,
    profile: Option<Profile>,
    api_key: Option<String>,
    key_source: Option<KeySource>,
}

impl AuthState {
    pub fn new(store: KvStore, config: &Config) -> Self {
        let profile = store
            .get(USER_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok());

        let (api_key, key_source) = resolve_key(std::env::var("GEMINI_API_KEY").ok(), config);

        Self {
            store,
            profile,
            api_key,
            key_source,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn key_source_label(&self) -> Option<&'static str> {
        match self.key_source {
            Some(KeySource::Env) => Some("env"),
            Some(KeySource::Config) => Some("config"),
            None => None,
        }
    }

    /// Mock GitHub sign-in, kept local to the machine.
    pub fn login(&mut self) {
        let profile = Profile {
            username: "Architect_User".to_string(),
            avatar_url: "https://api.dicebear.com/7.x/avataaars/svg?seed=Architect".to_string(),
        };
        if let Ok(raw) = serde_json::to_string(&profile) {
            self.store.set(USER_KEY, &raw);
        }
        self.profile = Some(profile);
    }

    pub fn logout(&mut self) {
        self.profile = None;
        self.store.remove(USER_KEY);
    }

    /// Adopts a user-entered key for this session and saves it to the
    /// config file for the next one.
    pub fn store_key(&mut self, key: &str) {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return;
        }
        if let Err(err) = Config::save_api_key(trimmed) {
            warn!(error = %err, "could not save API key to config");
        }
        self.api_key = Some(trimmed.to_string());
        self.key_source = Some(KeySource::Config);
    }
}

fn resolve_key(env_key: Option<String>, config: &Config) -> (Option<String>, Option<KeySource>) {
    match env_key {
        Some(key) if !key.is_empty() => (Some(key), Some(KeySource::Env)),
        _ => match &config.gemini_api_key {
            Some(key) => (Some(key.clone()), Some(KeySource::Config)),
            None => (None, None),
        },
    }
}
