/// The systems languages the hub teaches. `Option<Language>` is used where
/// a general, language-agnostic scope is possible (`None` = General).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Zig,
    Elixir,
    Rust,
    Mojo,
    Gleam,
    Nim,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Zig => "Zig",
            Language::Elixir => "Elixir",
            Language::Rust => "Rust",
            Language::Mojo => "Mojo",
            Language::Gleam => "Gleam",
            Language::Nim => "Nim",
        }
    }

    /// Lowercase name used in generated shell flags and file templates.
    pub fn slug(&self) -> &'static str {
        match self {
            Language::Zig => "zig",
            Language::Elixir => "elixir",
            Language::Rust => "rust",
            Language::Mojo => "mojo",
            Language::Gleam => "gleam",
            Language::Nim => "nim",
        }
    }

    pub fn from_str(s: &str) -> Option<Language> {
        match s.to_lowercase().as_str() {
            "zig" => Some(Language::Zig),
            "elixir" => Some(Language::Elixir),
            "rust" => Some(Language::Rust),
            "mojo" => Some(Language::Mojo),
            "gleam" => Some(Language::Gleam),
            "nim" => Some(Language::Nim),
            _ => None,
        }
    }

    pub fn all() -> Vec<Language> {
        vec![
            Language::Zig,
            Language::Elixir,
            Language::Rust,
            Language::Mojo,
            Language::Gleam,
            Language::Nim,
        ]
    }
}

/// Display name for a tutoring scope, where `None` is the general track.
pub fn scope_name(scope: Option<Language>) -> &'static str {
    match scope {
        Some(language) => language.as_str(),
        None => "General",
    }
}

/// Catalog entry shown on the home screen.
#[derive(Debug, Clone, Copy)]
pub struct LanguageInfo {
    pub language: Language,
    pub icon: &'static str,
    pub tagline: &'static str,
    pub description: &'static str,
    pub docs_url: &'static str,
    /// Satellite languages orbit the core triad and get the general track.
    pub satellite: bool,
    pub coming_soon: bool,
}

pub const CATALOG: &[LanguageInfo] = &[
    LanguageInfo {
        language: Language::Zig,
        icon: "⚡",
        tagline: "Simple, fast, and safe.",
        description: "A general-purpose programming language and toolchain for maintaining robust, optimal, and reusable software.",
        docs_url: "https://ziglang.org/learn/",
        satellite: false,
        coming_soon: false,
    },
    LanguageInfo {
        language: Language::Elixir,
        icon: "💧",
        tagline: "Productive, concurrent, and scalable.",
        description: "A dynamic, functional language for building scalable and maintainable applications using the Erlang VM (BEAM).",
        docs_url: "https://elixir-lang.org/learning.html",
        satellite: false,
        coming_soon: false,
    },
    LanguageInfo {
        language: Language::Rust,
        icon: "🦀",
        tagline: "Performance, reliability, and productivity.",
        description: "A language empowering everyone to build reliable and efficient software with guaranteed memory safety.",
        docs_url: "https://www.rust-lang.org/learn",
        satellite: false,
        coming_soon: false,
    },
    LanguageInfo {
        language: Language::Mojo,
        icon: "🔥",
        tagline: "Python syntax, C performance.",
        description: "The future of AI infrastructure. Combining the usability of Python with the performance of C++ and Rust.",
        docs_url: "https://docs.modular.com/mojo/",
        satellite: true,
        coming_soon: false,
    },
    LanguageInfo {
        language: Language::Gleam,
        icon: "✨",
        tagline: "A friendly, type-safe BEAM language.",
        description: "A statically typed language for the Erlang VM, built for performance and maintainability in distributed systems.",
        docs_url: "https://gleam.run/",
        satellite: true,
        coming_soon: false,
    },
    LanguageInfo {
        language: Language::Nim,
        icon: "👑",
        tagline: "Efficient, expressive, elegant.",
        description: "A statically typed compiled systems programming language that combines the speed of C with the expressiveness of Python.",
        docs_url: "https://nim-lang.org/learn.html",
        satellite: true,
        coming_soon: true,
    },
];

pub fn info(language: Language) -> &'static LanguageInfo {
    // Every variant has a catalog entry, so the lookup cannot miss.
    CATALOG
        .iter()
        .find(|entry| entry.language == language)
        .unwrap_or(&CATALOG[0])
}

const ZIG_SUGGESTIONS: &[&str] = &[
    "Explain memory management in Zig",
    "How does comptime work?",
    "What makes error sets different from exceptions?",
    "Data-Oriented Design architecture in Zig",
];

const RUST_SUGGESTIONS: &[&str] = &[
    "How does the Borrow Checker guarantee safety?",
    "Explain the concept of Lifetimes",
    "Memory optimization with Smart Pointers",
];

const ELIXIR_SUGGESTIONS: &[&str] = &[
    "How does the Actor Model work on the BEAM?",
    "Explain Supervision Trees",
    "Implementing GenServer for state management",
];

const MOJO_SUGGESTIONS: &[&str] = &[
    "How does Mojo optimize GPU kernels?",
    "Differences between the Mojo and Rust memory models",
    "Python ecosystem integration in Mojo",
];

const GENERAL_SUGGESTIONS: &[&str] = &[
    "What is a BCI (Brain-Computer Interface) architecture?",
    "How do you handle <10ms latency for AR/VR?",
    "Principles of deterministic computation in XR",
];

/// Prompt suggestions for a scope. Scopes without a dedicated list fall
/// back to the general track.
pub fn suggestions(scope: Option<Language>) -> &'static [&'static str] {
    match scope {
        Some(Language::Zig) => ZIG_SUGGESTIONS,
        Some(Language::Rust) => RUST_SUGGESTIONS,
        Some(Language::Elixir) => ELIXIR_SUGGESTIONS,
        Some(Language::Mojo) => MOJO_SUGGESTIONS,
        _ => GENERAL_SUGGESTIONS,
    }
}

/// Case-insensitive substring filter over the scope's suggestions,
/// capped at four results. An empty input yields nothing.
pub fn filter_suggestions(scope: Option<Language>, input: &str) -> Vec<&'static str> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    suggestions(scope)
        .iter()
        .filter(|s| s.to_lowercase().contains(&needle))
        .take(4)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!(Language::from_str("zig"), Some(Language::Zig));
        assert_eq!(Language::from_str("ELIXIR"), Some(Language::Elixir));
        assert_eq!(Language::from_str("Rust"), Some(Language::Rust));
        assert_eq!(Language::from_str("cobol"), None);
    }

    #[test]
    fn test_catalog_covers_every_language() {
        for language in Language::all() {
            assert_eq!(info(language).language, language);
        }
    }

    #[test]
    fn test_scope_name_general_for_none() {
        assert_eq!(scope_name(None), "General");
        assert_eq!(scope_name(Some(Language::Mojo)), "Mojo");
    }

    #[test]
    fn test_filter_empty_input_yields_nothing() {
        assert!(filter_suggestions(Some(Language::Zig), "").is_empty());
        assert!(filter_suggestions(Some(Language::Zig), "   ").is_empty());
    }

    #[test]
    fn test_filter_matches_case_insensitively() {
        let hits = filter_suggestions(Some(Language::Zig), "COMPTIME");
        assert_eq!(hits, vec!["How does comptime work?"]);
    }

    #[test]
    fn test_filter_caps_at_four() {
        // "i" appears in every Zig suggestion.
        let hits = filter_suggestions(Some(Language::Zig), "i");
        assert!(hits.len() <= 4);
    }

    #[test]
    fn test_scopes_without_list_fall_back_to_general() {
        assert_eq!(suggestions(Some(Language::Gleam)), GENERAL_SUGGESTIONS);
        assert_eq!(suggestions(None), GENERAL_SUGGESTIONS);
    }
}
