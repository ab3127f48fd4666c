use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::OnceLock;

use crate::gateway::{GatewayError, ModelGateway};
use crate::language::{scope_name, Language};
use crate::roadmap::RoadmapStep;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// The pro model answers chat, the flash model handles structured and
// low-stakes generation.
const CHAT_MODEL: &str = "gemini-3-pro-preview";
const FLASH_MODEL: &str = "gemini-3-flash-preview";

// Shown instead of an empty model reply.
const EMPTY_REPLY: &str = "Sorry, an architectural blueprint could not be generated right now.";
const EMPTY_EXAMPLE: &str = "Technical documentation not found.";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

impl Content {
    fn text(text: &str) -> Self {
        Self {
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

fn extract_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

/// Flash models sometimes wrap structured output in a markdown fence even
/// when a JSON mime type was requested. Strip it before parsing.
fn strip_json_fences(text: &str) -> String {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"^```(?:json)?\s*|\s*```$").expect("invalid fence pattern")
    });
    fence.replace_all(text.trim(), "").trim().to_string()
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
        }
    }

    /// Sends one generateContent call and classifies any failure. Quota is
    /// decided here, from the 429 status or a quota-marked error body, so
    /// callers only ever match on the variant.
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<String, GatewayError> {
        let url = format!("{}/models/{}:generateContent", BASE_URL, model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|err| GatewayError::Network(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GatewayError::Quota);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            if detail.to_lowercase().contains("quota") {
                return Err(GatewayError::Quota);
            }
            return Err(GatewayError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        Ok(extract_text(body))
    }
}

fn mentor_instruction(scope: Option<Language>) -> String {
    format!(
        "You are a world-class \"Architectural Mentor\" specializing in Zig, Elixir, and Rust.\n\
         Current context: {}.\n\
         \n\
         YOUR PHILOSOPHY:\n\
         1. New technologies like Zig/Rust/Elixir do not exist to brutally replace older languages, but to revolutionize architecture step by step.\n\
         2. You are deeply versed in Edge Web Technologies, Spatial Computing (AR/VR), and Brain-Computer Interfaces (BCI).\n\
         3. You emphasize runtime precision, compiler efficiency, and memory safety as the foundation of the future.\n\
         4. Give answers that are wise and educational while staying deeply technical.\n\
         \n\
         Your goal is to help the user understand the \"Why\" (architecture) behind the \"How\" (syntax).",
        scope_name(scope)
    )
}

fn roadmap_prompt(language: Language) -> String {
    format!(
        "Generate a structured 5-step learning roadmap for the {} language.\n\
         Make sure every step includes:\n\
         - A title\n\
         - A philosophical description of the system architecture\n\
         - 3-4 key concepts (include a name and a short definition of at most 15 words)\n\
         - 3-4 \"Related Concepts\" or additional paradigms (include a name and a short definition of at most 15 words).",
        language.as_str()
    )
}

fn concept_prompt(language: Language, concept: &str) -> String {
    format!(
        "Provide an idiomatic code example and a short architectural explanation (2-3 sentences) for the concept: \"{}\" in the {} language.\n\
         Use clean Markdown with syntax highlighting.",
        concept,
        language.as_str()
    )
}

fn roadmap_schema() -> serde_json::Value {
    let concept_items = json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING" },
            "definition": { "type": "STRING" }
        },
        "required": ["name", "definition"]
    });
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "description": { "type": "STRING" },
                "concepts": { "type": "ARRAY", "items": concept_items },
                "relatedConcepts": { "type": "ARRAY", "items": concept_items }
            },
            "required": ["title", "description", "concepts", "relatedConcepts"]
        }
    })
}

#[async_trait]
impl ModelGateway for GeminiClient {
    async fn generate_text(
        &self,
        prompt: &str,
        scope: Option<Language>,
    ) -> Result<String, GatewayError> {
        let request = GenerateRequest {
            contents: vec![Content::text(prompt)],
            system_instruction: Some(Content::text(&mentor_instruction(scope))),
            generation_config: Some(GenerationConfig {
                temperature: Some(0.7),
                response_mime_type: None,
                response_schema: None,
            }),
        };
        let text = self.generate(CHAT_MODEL, &request).await?;
        if text.trim().is_empty() {
            return Ok(EMPTY_REPLY.to_string());
        }
        Ok(text)
    }

    async fn generate_roadmap(&self, language: Language) -> Result<Vec<RoadmapStep>, GatewayError> {
        let request = GenerateRequest {
            contents: vec![Content::text(&roadmap_prompt(language))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: None,
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(roadmap_schema()),
            }),
        };
        let text = self.generate(FLASH_MODEL, &request).await?;
        let cleaned = strip_json_fences(&text);
        if cleaned.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&cleaned)
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))
    }

    async fn generate_concept_example(
        &self,
        language: Language,
        concept: &str,
    ) -> Result<String, GatewayError> {
        let request = GenerateRequest {
            contents: vec![Content::text(&concept_prompt(language, concept))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(0.4),
                response_mime_type: None,
                response_schema: None,
            }),
        };
        let text = self.generate(FLASH_MODEL, &request).await?;
        if text.trim().is_empty() {
            return Ok(EMPTY_EXAMPLE.to_string());
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_with_camel_case_keys() {
        let request = GenerateRequest {
            contents: vec![Content::text("hello")],
            system_instruction: Some(Content::text("be brief")),
            generation_config: Some(GenerationConfig {
                temperature: Some(0.7),
                response_mime_type: Some("application/json".to_string()),
                response_schema: None,
            }),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("systemInstruction").is_some());
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_response_text_extraction() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"first "},{"text":"second"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_text(parsed), "first second");
    }

    #[test]
    fn test_empty_candidates_extract_to_empty_string() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_text(parsed), "");
    }

    #[test]
    fn test_strip_json_fences() {
        assert_eq!(strip_json_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_json_fences("```\n[]\n```"), "[]");
        assert_eq!(strip_json_fences("  [1]  "), "[1]");
        // Interior fences belong to the payload and stay untouched.
        assert_eq!(
            strip_json_fences(r#"["```json"]"#),
            r#"["```json"]"#
        );
    }

    #[test]
    fn test_roadmap_schema_requires_all_step_fields() {
        let schema = roadmap_schema();
        let required = schema["items"]["required"].as_array().unwrap();
        for field in ["title", "description", "concepts", "relatedConcepts"] {
            assert!(required.iter().any(|value| value == field));
        }
    }
}
