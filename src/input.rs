//! Input parsing for Claude Code settings files
//!
//! Reads the permission sections of the three settings layers. Missing
//! files and missing keys are empty rule lists, never errors.

use serde::Deserialize;
use std::path::Path;

use crate::rules::Scope;

/// The permission section of one settings layer: raw rule strings per
/// action, in file order, with no deduplication applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    pub allow: Vec<String>,
    pub ask: Vec<String>,
    pub deny: Vec<String>,
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Accept both the bare permissions object and a whole settings
        // file with a "permissions" key
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl PermissionSet {
    /// Extract from a JSON value, tolerating either
    /// `{"allow": [...], ...}` or `{"permissions": {"allow": [...]}}`
    pub fn from_value(value: &serde_json::Value) -> Self {
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => return Self::default(),
        };
        let obj = match obj.get("permissions").and_then(|v| v.as_object()) {
            Some(inner) => inner,
            None => obj,
        };

        let list = |key: &str| -> Vec<String> {
            obj.get(key)
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default()
        };

        Self {
            allow: list("allow"),
            ask: list("ask"),
            deny: list("deny"),
        }
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load from a settings file; a missing file is an empty set
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.ask.is_empty() && self.deny.is_empty()
    }

    /// Total rule count across all actions
    pub fn len(&self) -> usize {
        self.allow.len() + self.ask.len() + self.deny.len()
    }
}

/// Two scope files resolving to the same underlying store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeAlias {
    /// The more specific scope, whose rules are kept
    pub kept: Scope,

    /// The broader scope, treated as empty for the run
    pub dropped: Scope,

    /// The shared underlying path
    pub path: String,
}

/// The three scope layers plus any aliases detected at load time
#[derive(Debug, Clone, Default)]
pub struct ReconcileInput {
    pub user: PermissionSet,
    pub project_shared: PermissionSet,
    pub project_local: PermissionSet,
    pub aliases: Vec<ScopeAlias>,
}

impl ReconcileInput {
    /// Parse a combined document:
    /// `{"user": {...}, "project_shared": {...}, "project_local": {...}}`.
    /// Missing scopes are empty.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let scope = |key: &str| {
            value
                .get(key)
                .map(PermissionSet::from_value)
                .unwrap_or_default()
        };
        Ok(Self {
            user: scope("user"),
            project_shared: scope("project_shared"),
            project_local: scope("project_local"),
            aliases: Vec::new(),
        })
    }

    /// Load the three layers from files.
    ///
    /// Paths resolving to the same underlying file (symlinked settings)
    /// are detected before reconciliation; the broader scope's copy is
    /// dropped so one logical store is not counted as two rule sets.
    pub fn load(
        user: Option<&Path>,
        project_shared: Option<&Path>,
        project_local: Option<&Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let paths = [
            (Scope::User, user),
            (Scope::ProjectShared, project_shared),
            (Scope::ProjectLocal, project_local),
        ];

        // Canonicalize what exists; most specific scope wins an alias
        let mut canonical: Vec<(Scope, std::path::PathBuf)> = Vec::new();
        for (scope, path) in paths.iter() {
            if let Some(p) = path {
                if let Ok(canon) = std::fs::canonicalize(p) {
                    canonical.push((*scope, canon));
                }
            }
        }

        let mut aliases = Vec::new();
        let mut dropped = Vec::new();
        for i in 0..canonical.len() {
            for j in (i + 1)..canonical.len() {
                if canonical[i].1 == canonical[j].1 {
                    // Scopes are ordered broadest-first, so j is kept
                    aliases.push(ScopeAlias {
                        kept: canonical[j].0,
                        dropped: canonical[i].0,
                        path: canonical[i].1.display().to_string(),
                    });
                    dropped.push(canonical[i].0);
                }
            }
        }

        let load_scope = |scope: Scope, path: Option<&Path>| {
            if dropped.contains(&scope) {
                return Ok(PermissionSet::default());
            }
            match path {
                Some(p) => PermissionSet::load(p),
                None => Ok(PermissionSet::default()),
            }
        };

        Ok(Self {
            user: load_scope(Scope::User, user)?,
            project_shared: load_scope(Scope::ProjectShared, project_shared)?,
            project_local: load_scope(Scope::ProjectLocal, project_local)?,
            aliases,
        })
    }

    /// The raw rule strings of one scope
    pub fn scope(&self, scope: Scope) -> &PermissionSet {
        match scope {
            Scope::User => &self.user,
            Scope::ProjectShared => &self.project_shared,
            Scope::ProjectLocal => &self.project_local,
        }
    }

    /// Total rule count across all scopes
    pub fn len(&self) -> usize {
        self.user.len() + self.project_shared.len() + self.project_local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
