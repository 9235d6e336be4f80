//! Configuration loading for claude-reconcile
//!
//! Supports TOML configuration with embedded defaults.

use serde::Deserialize;
use std::path::PathBuf;

/// General configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable audit logging
    pub audit_log: bool,

    /// Path to audit log file
    pub audit_path: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            audit_log: true,
            audit_path: Some("~/.claude/reconcile/audit.jsonl".to_string()),
        }
    }
}

/// Consolidation configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Run the consolidation pass at all
    pub enabled: bool,

    /// Prior confirmation signal for medium-tier proposals
    /// (also settable per-run via RECONCILE_MEDIUM_OK=1)
    pub allow_medium: bool,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_medium: false,
        }
    }
}

/// Tool identifier configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ToolsConfig {
    /// Extra tool identifiers accepted beyond the built-in list
    pub known: Vec<String>,
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub consolidation: ConsolidationConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load() -> Self {
        // Try to load from standard locations
        let config_paths = [
            // User-specific config
            dirs::home_dir().map(|p| p.join(".claude/reconcile/config.toml")),
            // System-wide config
            Some(PathBuf::from("/etc/claude-reconcile/config.toml")),
        ];

        for path in config_paths.into_iter().flatten() {
            if path.exists() {
                if let Ok(content) = std::fs::read_to_string(&path) {
                    match toml::from_str(&content) {
                        Ok(config) => return config,
                        Err(e) => {
                            eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                        }
                    }
                }
            }
        }

        // Return defaults
        Config::default()
    }

    /// Load from a specific path
    pub fn load_from(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Expand ~ in path strings
    pub fn expand_path(path: &str) -> PathBuf {
        if path.starts_with("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(&path[2..]);
            }
        }
        PathBuf::from(path)
    }

    /// Get the audit log path (expanded)
    pub fn audit_path(&self) -> Option<PathBuf> {
        self.general.audit_path.as_ref().map(|p| Self::expand_path(p))
    }
}

/// Embedded default configuration
pub const DEFAULT_CONFIG_TOML: &str = r#"
[general]
audit_log = true
audit_path = "~/.claude/reconcile/audit.jsonl"

[consolidation]
enabled = true
allow_medium = false

[tools]
known = []
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.general.audit_log);
        assert!(config.consolidation.enabled);
        assert!(!config.consolidation.allow_medium);
        assert!(config.tools.known.is_empty());
    }

    #[test]
    fn test_parse_embedded_config() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert!(config.consolidation.enabled);
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [consolidation]
            allow_medium = true

            [tools]
            known = ["MyTool"]
            "#,
        )
        .unwrap();
        assert!(config.consolidation.allow_medium);
        assert_eq!(config.tools.known, vec!["MyTool"]);
        // Untouched sections keep their defaults
        assert!(config.general.audit_log);
    }

    #[test]
    fn test_expand_path() {
        let expanded = Config::expand_path("~/.claude/reconcile/audit.jsonl");
        assert!(!expanded.to_string_lossy().starts_with("~"));
    }
}
