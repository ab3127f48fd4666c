use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gateway::{GatewayError, ModelGateway};
use crate::language::Language;
use crate::store::KvStore;

pub const MESSAGES_KEY: &str = "triadhub_chat_messages";
pub const FEEDBACK_KEY: &str = "triadhub_chat_feedback";

/// Exactly two canned failure strings ever enter the transcript. The UI
/// compares against these constants (never substring matching) to decide
/// which recovery affordance to offer.
pub const QUOTA_ERROR: &str = "The system is busy (Quota Exceeded). Please try again later.";
pub const CONNECTION_ERROR: &str =
    "Failed to reach the architectural mentor. Check your connection and try again.";

const WELCOME_ID: &str = "initial-welcome";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default)]
    pub is_error: bool,
}

impl ChatMessage {
    fn new(role: Role, content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            is_loading: false,
            is_error: false,
        }
    }

    fn user(content: &str) -> Self {
        Self::new(Role::User, content)
    }

    fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::new(Role::Model, "")
        }
    }

    fn welcome(scope: Option<Language>) -> Self {
        let focus = match scope {
            Some(language) => language.as_str().to_string(),
            None => "Zig, Elixir, or Rust".to_string(),
        };
        Self {
            id: WELCOME_ID.to_string(),
            ..Self::new(
                Role::Model,
                &format!(
                    "Welcome to the Architectural Lab. I am your assistant for mastering {}. \
                     What blueprint shall we discuss today?",
                    focus
                ),
            )
        }
    }
}

/// The one in-flight request. Its presence is the single source of truth
/// for "a send is running"; the placeholder message it points at is just
/// how the transcript renders that state.
#[derive(Debug, Clone)]
struct PendingExchange {
    message_id: String,
}

/// Append-only chat transcript plus per-message feedback, persisted through
/// the shared store on every change. At most one exchange is in flight at a
/// time; attempts to start a second are dropped without comment, matching
/// what the input field shows (a disabled send).
pub struct ChatSession {
    store: KvStore,
    messages: Vec<ChatMessage>,
    feedback: HashMap<String, Rating>,
    pending: Option<PendingExchange>,
}

impl ChatSession {
    /// Loads the transcript and feedback from the store. A placeholder that
    /// leaked into storage (e.g. the process died mid-send) is dropped here
    /// as well, so a stale spinner can never be revived.
    pub fn new(store: KvStore) -> Self {
        let mut messages: Vec<ChatMessage> = store
            .get(MESSAGES_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        messages.retain(|message| !message.is_loading);

        let feedback = store
            .get(FEEDBACK_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();

        Self {
            store,
            messages,
            feedback,
            pending: None,
        }
    }

    /// Seeds the welcome message into an empty transcript. A transcript
    /// with any history is left alone, whatever scope it was built under.
    pub fn initialize(&mut self, scope: Option<Language>) {
        if !self.messages.is_empty() {
            return;
        }
        self.messages.push(ChatMessage::welcome(scope));
        self.persist_messages();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn rating_for(&self, message_id: &str) -> Option<Rating> {
        self.feedback.get(message_id).copied()
    }

    pub fn last_user_content(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.clone())
    }

    /// Starts an exchange: appends the user message (unless retrying) and a
    /// loading placeholder, fills the pending slot, and returns the prompt
    /// to send. Returns `None`, changing nothing, when the input is blank
    /// or an exchange is already running.
    ///
    /// On retry the trailing message is removed first, but only if it is an
    /// error; a successful reply is never trimmed.
    pub fn begin_send(&mut self, content: &str, is_retry: bool) -> Option<String> {
        let trimmed = content.trim();
        if trimmed.is_empty() || self.pending.is_some() {
            return None;
        }

        if is_retry {
            if self.messages.last().is_some_and(|message| message.is_error) {
                self.messages.pop();
            }
        } else {
            self.messages.push(ChatMessage::user(trimmed));
        }

        let placeholder = ChatMessage::loading();
        self.pending = Some(PendingExchange {
            message_id: placeholder.id.clone(),
        });
        self.messages.push(placeholder);
        self.persist_messages();

        Some(trimmed.to_string())
    }

    /// Resolves the pending exchange into the placeholder message. On
    /// failure the placeholder becomes one of the two canned error strings,
    /// split only by the quota variant. A completion with no pending
    /// exchange is stale and ignored.
    pub fn complete_send(&mut self, result: Result<String, GatewayError>) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if let Some(message) = self
            .messages
            .iter_mut()
            .find(|message| message.id == pending.message_id)
        {
            message.is_loading = false;
            match result {
                Ok(text) => message.content = text,
                Err(err) => {
                    message.is_error = true;
                    message.content = if err.is_quota() {
                        QUOTA_ERROR.to_string()
                    } else {
                        CONNECTION_ERROR.to_string()
                    };
                }
            }
        }
        self.persist_messages();
    }

    /// One full exchange against the gateway. The interactive screen drives
    /// `begin_send`/`complete_send` separately so the placeholder renders
    /// while the call is in flight; this composed form serves everything
    /// that awaits the reply in place.
    pub async fn send(&mut self, gateway: &dyn ModelGateway, content: &str, scope: Option<Language>) {
        self.dispatch(gateway, content, scope, false).await;
    }

    /// Re-sends the most recent user message, replacing a trailing error.
    /// Does nothing if no user message exists.
    pub async fn retry_last(&mut self, gateway: &dyn ModelGateway, scope: Option<Language>) {
        let Some(content) = self.last_user_content() else {
            return;
        };
        self.dispatch(gateway, &content, scope, true).await;
    }

    async fn dispatch(
        &mut self,
        gateway: &dyn ModelGateway,
        content: &str,
        scope: Option<Language>,
        is_retry: bool,
    ) {
        let Some(prompt) = self.begin_send(content, is_retry) else {
            return;
        };
        let result = gateway.generate_text(&prompt, scope).await;
        self.complete_send(result);
    }

    /// Records feedback for a message. Re-rating overwrites; entries are
    /// never removed, even when the message they point at is trimmed away.
    pub fn rate_message(&mut self, message_id: &str, rating: Rating) {
        self.feedback.insert(message_id.to_string(), rating);
        self.persist_feedback();
    }

    fn persist_messages(&self) {
        let snapshot: Vec<&ChatMessage> = self
            .messages
            .iter()
            .filter(|message| !message.is_loading)
            .collect();
        if let Ok(raw) = serde_json::to_string(&snapshot) {
            self.store.set(MESSAGES_KEY, &raw);
        }
    }

    fn persist_feedback(&self) {
        if let Ok(raw) = serde_json::to_string(&self.feedback) {
            self.store.set(FEEDBACK_KEY, &raw);
        }
    }
}
