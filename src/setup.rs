use crate::language::Language;

/// Languages offered by the provisioning wizard.
pub const WIZARD_LANGUAGES: [Language; 4] = [
    Language::Zig,
    Language::Rust,
    Language::Elixir,
    Language::Nim,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Linux,
    Macos,
}

impl TargetOs {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetOs::Linux => "linux",
            TargetOs::Macos => "macos",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TargetOs::Linux => "Linux",
            TargetOs::Macos => "macOS",
        }
    }

    pub fn toggled(&self) -> TargetOs {
        match self {
            TargetOs::Linux => TargetOs::Macos,
            TargetOs::Macos => TargetOs::Linux,
        }
    }
}

/// Selections driving every generated artifact on the setup screen.
#[derive(Debug, Clone)]
pub struct SetupOptions {
    pub languages: Vec<Language>,
    pub include_tools: bool,
    pub target_os: TargetOs,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            languages: vec![Language::Zig, Language::Rust, Language::Elixir],
            include_tools: true,
            target_os: TargetOs::Linux,
        }
    }
}

impl SetupOptions {
    pub fn includes(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }

    /// Toggling off removes the language; toggling back on appends it, so
    /// re-added languages move to the end of every generated list.
    pub fn toggle_language(&mut self, language: Language) {
        if let Some(position) = self.languages.iter().position(|l| *l == language) {
            self.languages.remove(position);
        } else {
            self.languages.push(language);
        }
    }
}

/// Renders the `flake.nix` blueprint for the selected runtimes.
pub fn flake_nix(options: &SetupOptions) -> String {
    let runtimes = options
        .languages
        .iter()
        .map(|l| l.slug())
        .collect::<Vec<_>>()
        .join(" ");
    let tools = if options.include_tools {
        "erlang-ls rust-analyzer zls nim-lang-server"
    } else {
        ""
    };
    let banner = options
        .languages
        .iter()
        .map(|l| l.slug().to_uppercase())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"{{
  description = "Triad Hub Architectural Environment";
  inputs = {{ nixpkgs.url = "github:NixOS/nixpkgs/nixos-unstable"; }};
  outputs = {{ self, nixpkgs }}:
    let pkgs = nixpkgs.legacyPackages.x86_64-linux;
    in {{
      devShells.x86_64-linux.default = pkgs.mkShell {{
        buildInputs = with pkgs; [
          {runtimes}
          {tools}
        ];
        shellHook = "echo 'Triad Lab: [{banner}] Ready.'";
      }};
    }};
}}"#
    )
}

/// Renders the `devcontainer.json` blueprint for the selected runtimes.
pub fn devcontainer_json(options: &SetupOptions) -> String {
    let features = options
        .languages
        .iter()
        .map(|l| format!("\"ghcr.io/devcontainers/features/{}:1\": {{}}", l.slug()))
        .collect::<Vec<_>>()
        .join(",\n    ");
    let extensions = if options.include_tools {
        "\"ziglang.vscode-zig\", \"rust-lang.rust-analyzer\", \"elixir-lsp.elixir-ls\""
    } else {
        "\"\""
    };

    format!(
        r#"{{
  "name": "Triad Hub Lab",
  "image": "mcr.microsoft.com/devcontainers/base:ubuntu",
  "features": {{
    {features}
  }},
  "customizations": {{
    "vscode": {{
      "extensions": [
        {extensions}
      ]
    }}
  }}
}}"#
    )
}

/// One-line provisioning command mirroring the current selections.
pub fn provision_command(options: &SetupOptions) -> String {
    let mut flags: Vec<String> = options
        .languages
        .iter()
        .map(|l| format!("--{}", l.slug()))
        .collect();
    if options.include_tools {
        flags.push("--with-tools".to_string());
    }
    flags.push(format!("--os {}", options.target_os.as_str()));

    format!(
        "curl -fsSL https://triad-hub.io/provision | bash -s -- {}",
        flags.join(" ")
    )
}

#[derive(Debug, Clone, Copy)]
pub struct StarterGuide {
    pub command: &'static str,
    pub description: &'static str,
    pub tree: &'static str,
}

/// Project initialization guide for one wizard language, in a basic and an
/// advanced flavor. Languages outside the wizard have none.
pub fn starter_guide(language: Language, advanced: bool) -> Option<StarterGuide> {
    let guide = match (language, advanced) {
        (Language::Zig, false) => StarterGuide {
            command: "zig init",
            description: "Initialize a standard Zig executable project.",
            tree: "project/\n├── build.zig\n└── src/\n    └── main.zig",
        },
        (Language::Zig, true) => StarterGuide {
            command: "zig init-exe && mkdir deps src/c",
            description: "Template for high-performance systems interacting with C libraries via C-Interop.",
            tree: "project/\n├── build.zig (modified for C)\n├── src/\n│   ├── main.zig\n│   └── c/\n│       ├── bridge.c\n│       └── bridge.h\n└── deps/\n    └── vendor_lib/",
        },
        (Language::Rust, false) => StarterGuide {
            command: "cargo new my_app",
            description: "Create a new Rust binary package with standard configuration.",
            tree: "my_app/\n├── Cargo.toml\n└── src/\n    └── main.rs",
        },
        (Language::Rust, true) => StarterGuide {
            command: "cargo new my_workspace --lib && mkdir crates",
            description: "Multi-crate workspace architecture for large-scale modular systems.",
            tree: "my_workspace/\n├── Cargo.toml (workspace definition)\n├── crates/\n│   ├── core-logic/\n│   │   ├── Cargo.toml\n│   │   └── src/lib.rs\n│   └── cli-tool/\n│       ├── Cargo.toml\n│       └── src/main.rs\n└── README.md",
        },
        (Language::Elixir, false) => StarterGuide {
            command: "mix new my_app",
            description: "Generate a new Elixir project structure.",
            tree: "my_app/\n├── mix.exs\n├── lib/\n│   └── my_app.ex\n└── test/",
        },
        (Language::Elixir, true) => StarterGuide {
            command: "mix new my_dist_app --sup",
            description: "Distributed OTP Supervision tree architecture for fault-tolerant systems.",
            tree: "my_dist_app/\n├── mix.exs\n├── lib/\n│   ├── my_app/\n│   │   ├── application.ex\n│   │   ├── supervisor.ex\n│   │   └── worker.ex\n│   └── my_app.ex\n└── config/\n    ├── config.exs\n    └── runtime.exs",
        },
        (Language::Nim, false) => StarterGuide {
            command: "nimble init",
            description: "Initialize a new Nimble package.",
            tree: "project/\n├── project.nimble\n└── src/\n    └── project.nim",
        },
        (Language::Nim, true) => StarterGuide {
            command: "nimble init && mkdir tests docs bench",
            description: "Full-stack Nim package with testing suite and benchmarking nodes.",
            tree: "project/\n├── project.nimble\n├── src/\n│   └── project.nim\n├── tests/\n│   └── t_core.nim\n├── bench/\n│   └── bench_logic.nim\n└── docs/",
        },
        _ => return None,
    };
    Some(guide)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_provision_command() {
        let command = provision_command(&SetupOptions::default());
        assert_eq!(
            command,
            "curl -fsSL https://triad-hub.io/provision | bash -s -- --zig --rust --elixir --with-tools --os linux"
        );
    }

    #[test]
    fn test_provision_command_without_tools_on_macos() {
        let options = SetupOptions {
            languages: vec![Language::Zig],
            include_tools: false,
            target_os: TargetOs::Macos,
        };
        assert_eq!(
            provision_command(&options),
            "curl -fsSL https://triad-hub.io/provision | bash -s -- --zig --os macos"
        );
    }

    #[test]
    fn test_toggle_removes_then_appends() {
        let mut options = SetupOptions::default();
        options.toggle_language(Language::Zig);
        assert!(!options.includes(Language::Zig));

        options.toggle_language(Language::Zig);
        assert_eq!(
            options.languages,
            vec![Language::Rust, Language::Elixir, Language::Zig]
        );
    }

    #[test]
    fn test_flake_lists_runtimes_and_banner() {
        let flake = flake_nix(&SetupOptions::default());
        assert!(flake.contains("zig rust elixir"));
        assert!(flake.contains("erlang-ls rust-analyzer zls nim-lang-server"));
        assert!(flake.contains("Triad Lab: [ZIG, RUST, ELIXIR] Ready."));
    }

    #[test]
    fn test_flake_without_tools_omits_language_servers() {
        let options = SetupOptions {
            include_tools: false,
            ..SetupOptions::default()
        };
        assert!(!flake_nix(&options).contains("rust-analyzer"));
    }

    #[test]
    fn test_devcontainer_has_one_feature_per_language() {
        let json = devcontainer_json(&SetupOptions::default());
        assert!(json.contains("\"ghcr.io/devcontainers/features/zig:1\": {}"));
        assert!(json.contains("\"ghcr.io/devcontainers/features/rust:1\": {}"));
        assert!(json.contains("\"ghcr.io/devcontainers/features/elixir:1\": {}"));
        assert!(!json.contains("features/nim"));
    }

    #[test]
    fn test_devcontainer_extensions_empty_without_tools() {
        let options = SetupOptions {
            include_tools: false,
            ..SetupOptions::default()
        };
        let json = devcontainer_json(&options);
        assert!(!json.contains("rust-analyzer"));
        assert!(json.contains("\"\""));
    }

    #[test]
    fn test_starter_guides_cover_wizard_languages_only() {
        for language in WIZARD_LANGUAGES {
            assert!(starter_guide(language, false).is_some());
            assert!(starter_guide(language, true).is_some());
        }
        assert!(starter_guide(Language::Mojo, false).is_none());
        assert!(starter_guide(Language::Gleam, true).is_none());
    }

    #[test]
    fn test_advanced_rust_guide_is_a_workspace() {
        let guide = starter_guide(Language::Rust, true).unwrap();
        assert_eq!(guide.command, "cargo new my_workspace --lib && mkdir crates");
        assert!(guide.tree.contains("workspace definition"));
    }
}
