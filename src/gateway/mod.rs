use async_trait::async_trait;
use thiserror::Error;

use crate::language::Language;
use crate::roadmap::RoadmapStep;

pub mod gemini;

pub use gemini::GeminiClient;

/// Failure classes for model calls. The concrete client decides the class
/// once, at the HTTP boundary; callers match on the variant and never
/// inspect message text.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("quota exceeded")]
    Quota,

    #[error("api error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn is_quota(&self) -> bool {
        matches!(self, GatewayError::Quota)
    }
}

/// The model backend behind the tutor. One implementation talks to the
/// Gemini API; tests swap in scripted fakes.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Free-form mentor reply for a chat prompt within a language scope.
    async fn generate_text(
        &self,
        prompt: &str,
        scope: Option<Language>,
    ) -> Result<String, GatewayError>;

    /// Structured learning roadmap for a language. An empty vec is a valid
    /// outcome, not an error.
    async fn generate_roadmap(&self, language: Language) -> Result<Vec<RoadmapStep>, GatewayError>;

    /// Idiomatic code example plus a short explanation for one concept.
    async fn generate_concept_example(
        &self,
        language: Language,
        concept: &str,
    ) -> Result<String, GatewayError>;
}
