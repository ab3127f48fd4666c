use crate::language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    HighThroughput,
    FaultTolerance,
    LowLatency,
    RealTime,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::HighThroughput => "High Throughput",
            Category::FaultTolerance => "Fault Tolerance",
            Category::LowLatency => "Low Latency",
            Category::RealTime => "Real-time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Architect,
    Senior,
    Lead,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Architect => "Architect",
            Difficulty::Senior => "Senior",
            Difficulty::Lead => "Lead",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Stat {
    pub label: &'static str,
    pub value: &'static str,
}

/// A curated reference architecture shown on the blueprints screen.
#[derive(Debug, Clone, Copy)]
pub struct Blueprint {
    pub id: &'static str,
    pub title: &'static str,
    pub category: Category,
    pub languages: &'static [Language],
    pub description: &'static str,
    pub stats: &'static [Stat],
    pub difficulty: Difficulty,
}

pub const BLUEPRINTS: &[Blueprint] = &[
    Blueprint {
        id: "distributed-ledger",
        title: "High-Frequency Distributed Ledger",
        category: Category::HighThroughput,
        languages: &[Language::Rust, Language::Elixir],
        description: "A distributed ledger architecture separating the storage engine (Rust) from consensus coordination (Elixir/OTP) to handle 1M+ TPS.",
        stats: &[
            Stat { label: "Latency", value: "< 2ms" },
            Stat { label: "Safety", value: "Memory-Safe" },
            Stat { label: "Scale", value: "10M+ nodes" },
        ],
        difficulty: Difficulty::Lead,
    },
    Blueprint {
        id: "spatial-engine",
        title: "Spatial Compute Engine Core",
        category: Category::LowLatency,
        languages: &[Language::Zig],
        description: "A spatial compute engine for AR/VR built with Zig comptime for SIMD optimization and deterministic memory management.",
        stats: &[
            Stat { label: "Overhead", value: "Zero-cost" },
            Stat { label: "Binary", value: "< 500KB" },
            Stat { label: "Precision", value: "Bit-exact" },
        ],
        difficulty: Difficulty::Architect,
    },
    Blueprint {
        id: "fault-tolerant-gateway",
        title: "Global Edge Messaging Gateway",
        category: Category::FaultTolerance,
        languages: &[Language::Elixir, Language::Rust],
        description: "A global messaging gateway using Rust for fast TLS termination and Elixir for isolated session management across millions of users.",
        stats: &[
            Stat { label: "Uptime", value: "99.9999%" },
            Stat { label: "Concurrency", value: "2M / node" },
            Stat { label: "Healing", value: "Auto-Supervised" },
        ],
        difficulty: Difficulty::Senior,
    },
    Blueprint {
        id: "p2p-file-orchestrator",
        title: "Decentralized P2P Orchestrator",
        category: Category::RealTime,
        languages: &[Language::Rust, Language::Zig],
        description: "A P2P file orchestrator leveraging Rust for network security and Zig for efficient kernel-level disk I/O.",
        stats: &[
            Stat { label: "Protocols", value: "QUIC / TCP" },
            Stat { label: "I/O Speed", value: "Disk-bound" },
            Stat { label: "Reliability", value: "Deterministic" },
        ],
        difficulty: Difficulty::Architect,
    },
];

/// Filters the catalog, preserving its order. `None` means "All" for
/// either axis; the language filter matches any blueprint that features
/// the language.
pub fn filter(category: Option<Category>, language: Option<Language>) -> Vec<&'static Blueprint> {
    BLUEPRINTS
        .iter()
        .filter(|bp| category.map_or(true, |c| bp.category == c))
        .filter(|bp| language.map_or(true, |l| bp.languages.contains(&l)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter_returns_everything_in_order() {
        let all = filter(None, None);
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].id, "distributed-ledger");
        assert_eq!(all[3].id, "p2p-file-orchestrator");
    }

    #[test]
    fn test_category_filter() {
        let fault_tolerant = filter(Some(Category::FaultTolerance), None);
        assert_eq!(fault_tolerant.len(), 1);
        assert_eq!(fault_tolerant[0].id, "fault-tolerant-gateway");
    }

    #[test]
    fn test_language_filter_matches_any_position() {
        let rust = filter(None, Some(Language::Rust));
        assert_eq!(rust.len(), 3);

        let zig = filter(None, Some(Language::Zig));
        assert_eq!(zig.len(), 2);
    }

    #[test]
    fn test_combined_filter_can_be_empty() {
        let none = filter(Some(Category::LowLatency), Some(Language::Elixir));
        assert!(none.is_empty());
    }

    #[test]
    fn test_every_blueprint_has_three_stats() {
        for bp in BLUEPRINTS {
            assert_eq!(bp.stats.len(), 3, "{} should carry three stats", bp.id);
        }
    }
}
