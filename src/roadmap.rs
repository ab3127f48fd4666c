use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::gateway::{GatewayError, ModelGateway};
use crate::language::Language;
use crate::store::KvStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapStep {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub concepts: Vec<Concept>,
    #[serde(default)]
    pub related_concepts: Vec<Concept>,
}

/// Errors surfaced to the roadmap screen. Most gateway failures never get
/// here: languages with a static fallback swallow them.
#[derive(Debug, Error)]
pub enum RoadmapError {
    #[error("quota exceeded")]
    QuotaExceeded,

    #[error("roadmap generation failed: {0}")]
    Generation(String),
}

fn concept(name: &str, definition: &str) -> Concept {
    Concept {
        name: name.to_string(),
        definition: definition.to_string(),
    }
}

fn step(
    title: &str,
    description: &str,
    concepts: Vec<Concept>,
    related_concepts: Vec<Concept>,
) -> RoadmapStep {
    RoadmapStep {
        title: title.to_string(),
        description: description.to_string(),
        concepts,
        related_concepts,
    }
}

/// Hand-written roadmaps for the core triad, served when generation fails
/// or comes back empty. Satellite languages have no entry, which is a
/// valid state, not an error.
pub fn static_roadmap(language: Language) -> Option<Vec<RoadmapStep>> {
    match language {
        Language::Zig => Some(vec![
            step(
                "Foundational Memory Control",
                "Understanding manual memory management without hidden allocations.",
                vec![
                    concept(
                        "Manual Allocation",
                        "Explicitly requesting and freeing memory using allocators for total control.",
                    ),
                    concept(
                        "Defer Statement",
                        "Ensuring resource cleanup happens at the end of the current scope.",
                    ),
                    concept(
                        "Error Sets",
                        "Strict, typed error handling that forces developers to handle failures.",
                    ),
                ],
                vec![concept(
                    "Comptime",
                    "Running code at compile-time for zero-overhead generics and logic.",
                )],
            ),
            step(
                "The Comptime Paradigm",
                "Using Zig's most powerful feature to eliminate runtime overhead.",
                vec![
                    concept(
                        "Type Functions",
                        "Functions that return types, enabling powerful generic programming.",
                    ),
                    concept(
                        "Inline Loops",
                        "Unrolling loops at compile-time for maximum execution speed.",
                    ),
                ],
                vec![concept(
                    "Reflection",
                    "Inspecting types at compile-time to generate optimized code.",
                )],
            ),
        ]),
        Language::Rust => Some(vec![
            step(
                "The Ownership Model",
                "The core safety guarantee of Rust without a garbage collector.",
                vec![
                    concept(
                        "Borrow Checker",
                        "Compile-time validation of memory access rules to prevent data races.",
                    ),
                    concept(
                        "Lifetimes",
                        "Annotation that helps the compiler verify how long references are valid.",
                    ),
                ],
                vec![concept(
                    "RAII",
                    "Resource Acquisition Is Initialization: automatic resource management pattern.",
                )],
            ),
            step(
                "Zero-Cost Abstractions",
                "High-level features that compile down to efficient machine code.",
                vec![
                    concept(
                        "Traits",
                        "Defining shared behavior across different types like interfaces.",
                    ),
                    concept(
                        "Pattern Matching",
                        "Powerful control flow for destructuring data safely.",
                    ),
                ],
                vec![concept(
                    "Generics",
                    "Writing code that works for multiple types with no runtime cost.",
                )],
            ),
        ]),
        Language::Elixir => Some(vec![
            step(
                "The Actor Model & BEAM",
                "Scalability through lightweight, isolated processes.",
                vec![
                    concept(
                        "Processes",
                        "Extremely lightweight execution units managed by the Erlang VM.",
                    ),
                    concept(
                        "Message Passing",
                        "Communication between processes via asynchronous mailboxes.",
                    ),
                ],
                vec![concept(
                    "Functional Purity",
                    "Immutability and side-effect-free logic for predictable systems.",
                )],
            ),
            step(
                "Fault Tolerance (OTP)",
                "Building systems that can heal themselves from errors.",
                vec![
                    concept(
                        "Supervision Trees",
                        "Hierarchical process management that restarts failing workers.",
                    ),
                    concept(
                        "GenServer",
                        "Standard behavior for implementing client-server relationship in processes.",
                    ),
                ],
                vec![concept(
                    "Hot Reloading",
                    "Updating production code without stopping the running system.",
                )],
            ),
        ]),
        Language::Mojo | Language::Gleam | Language::Nim => None,
    }
}

/// Persistent per-language roadmap cache on top of the shared store.
#[derive(Clone)]
pub struct RoadmapCache {
    store: KvStore,
}

impl RoadmapCache {
    pub fn new(store: KvStore) -> Self {
        Self { store }
    }

    fn key(language: Language) -> String {
        format!("roadmap_{}", language.as_str())
    }

    /// A stored entry that no longer deserializes counts as a miss.
    pub fn get(&self, language: Language) -> Option<Vec<RoadmapStep>> {
        let raw = self.store.get(&Self::key(language))?;
        serde_json::from_str(&raw).ok()
    }

    pub fn set(&self, language: Language, steps: &[RoadmapStep]) {
        match serde_json::to_string(steps) {
            Ok(raw) => self.store.set(&Self::key(language), &raw),
            Err(err) => warn!(error = %err, "could not serialize roadmap for cache"),
        }
    }
}

#[derive(Clone)]
pub struct RoadmapService {
    cache: RoadmapCache,
}

impl RoadmapService {
    pub fn new(store: KvStore) -> Self {
        Self {
            cache: RoadmapCache::new(store),
        }
    }

    /// Resolves a roadmap through cache, generation, and static fallback,
    /// in that order:
    ///
    /// 1. A non-empty cached roadmap is returned without calling the model.
    /// 2. Otherwise the gateway generates one; a non-empty result is cached
    ///    and returned.
    /// 3. An empty result resolves through the static table (empty data,
    ///    not an error), and is never cached.
    /// 4. A failed call resolves through the static table too; only
    ///    languages without a static entry surface the failure, split into
    ///    quota and everything else.
    ///
    /// Retry is the caller's decision: this method never re-calls the
    /// gateway on its own.
    pub async fn get_roadmap(
        &self,
        gateway: &dyn ModelGateway,
        language: Language,
    ) -> Result<Vec<RoadmapStep>, RoadmapError> {
        if let Some(cached) = self.cache.get(language) {
            if !cached.is_empty() {
                return Ok(cached);
            }
        }

        match gateway.generate_roadmap(language).await {
            Ok(steps) if !steps.is_empty() => {
                self.cache.set(language, &steps);
                Ok(steps)
            }
            Ok(_) => Ok(static_roadmap(language).unwrap_or_default()),
            Err(err) => {
                if let Some(fallback) = static_roadmap(language) {
                    info!(
                        language = language.as_str(),
                        error = %err,
                        "roadmap generation failed, serving static fallback"
                    );
                    return Ok(fallback);
                }
                match err {
                    GatewayError::Quota => Err(RoadmapError::QuotaExceeded),
                    other => Err(RoadmapError::Generation(other.to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    struct ScriptedGateway {
        roadmaps: Mutex<VecDeque<Result<Vec<RoadmapStep>, GatewayError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedGateway {
        fn new(results: Vec<Result<Vec<RoadmapStep>, GatewayError>>) -> Self {
            Self {
                roadmaps: Mutex::new(results.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelGateway for ScriptedGateway {
        async fn generate_text(
            &self,
            _prompt: &str,
            _scope: Option<Language>,
        ) -> Result<String, GatewayError> {
            Ok(String::new())
        }

        async fn generate_roadmap(
            &self,
            _language: Language,
        ) -> Result<Vec<RoadmapStep>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.roadmaps
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Vec::new()))
        }

        async fn generate_concept_example(
            &self,
            _language: Language,
            _concept: &str,
        ) -> Result<String, GatewayError> {
            Ok(String::new())
        }
    }

    fn sample_steps() -> Vec<RoadmapStep> {
        vec![step(
            "Generated Step",
            "Fresh from the model.",
            vec![concept("A", "First concept.")],
            vec![],
        )]
    }

    #[tokio::test]
    async fn test_cache_hit_skips_gateway() {
        let store = KvStore::in_memory();
        let service = RoadmapService::new(store.clone());
        RoadmapCache::new(store).set(Language::Zig, &sample_steps());

        let gateway = ScriptedGateway::new(vec![]);
        let steps = service.get_roadmap(&gateway, Language::Zig).await.unwrap();

        assert_eq!(steps[0].title, "Generated Step");
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_fresh_result_is_cached() {
        let service = RoadmapService::new(KvStore::in_memory());
        let gateway = ScriptedGateway::new(vec![Ok(sample_steps())]);

        let first = service.get_roadmap(&gateway, Language::Mojo).await.unwrap();
        let second = service.get_roadmap(&gateway, Language::Mojo).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_result_serves_static_without_caching() {
        let service = RoadmapService::new(KvStore::in_memory());
        let gateway = ScriptedGateway::new(vec![Ok(Vec::new()), Ok(Vec::new())]);

        let steps = service.get_roadmap(&gateway, Language::Rust).await.unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].title, "The Ownership Model");
        assert_eq!(steps[1].title, "Zero-Cost Abstractions");

        // Nothing was cached, so the next lookup hits the gateway again.
        service.get_roadmap(&gateway, Language::Rust).await.unwrap();
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_result_without_static_is_empty_data() {
        let service = RoadmapService::new(KvStore::in_memory());
        let gateway = ScriptedGateway::new(vec![Ok(Vec::new())]);

        let steps = service.get_roadmap(&gateway, Language::Gleam).await.unwrap();
        assert!(steps.is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_swallowed_for_core_languages() {
        let service = RoadmapService::new(KvStore::in_memory());
        let gateway = ScriptedGateway::new(vec![Err(GatewayError::Quota)]);

        let steps = service.get_roadmap(&gateway, Language::Rust).await.unwrap();
        assert_eq!(steps[0].title, "The Ownership Model");
    }

    #[tokio::test]
    async fn test_quota_failure_surfaces_for_satellites() {
        let service = RoadmapService::new(KvStore::in_memory());
        let gateway = ScriptedGateway::new(vec![Err(GatewayError::Quota)]);

        let err = service
            .get_roadmap(&gateway, Language::Mojo)
            .await
            .unwrap_err();
        assert!(matches!(err, RoadmapError::QuotaExceeded));
    }

    #[tokio::test]
    async fn test_other_failures_surface_as_generation_errors() {
        let service = RoadmapService::new(KvStore::in_memory());
        let gateway = ScriptedGateway::new(vec![Err(GatewayError::Network(
            "connection refused".to_string(),
        ))]);

        let err = service
            .get_roadmap(&gateway, Language::Gleam)
            .await
            .unwrap_err();
        assert!(matches!(err, RoadmapError::Generation(_)));
    }

    #[tokio::test]
    async fn test_corrupt_cache_entry_is_a_miss() {
        let store = KvStore::in_memory();
        store.set("roadmap_Zig", "not a roadmap");
        let service = RoadmapService::new(store);
        let gateway = ScriptedGateway::new(vec![Ok(sample_steps())]);

        let steps = service.get_roadmap(&gateway, Language::Zig).await.unwrap();
        assert_eq!(steps[0].title, "Generated Step");
        assert_eq!(gateway.calls(), 1);
    }

    #[test]
    fn test_step_serde_uses_camel_case() {
        let value = serde_json::to_value(sample_steps()).unwrap();
        assert!(value[0].get("relatedConcepts").is_some());
    }

    #[test]
    fn test_static_table_covers_the_core_triad_only() {
        assert!(static_roadmap(Language::Zig).is_some());
        assert!(static_roadmap(Language::Rust).is_some());
        assert!(static_roadmap(Language::Elixir).is_some());
        assert!(static_roadmap(Language::Mojo).is_none());
        assert!(static_roadmap(Language::Nim).is_none());
    }
}
