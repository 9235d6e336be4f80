//! Core rule model for claude-reconcile
//!
//! Defines the action, scope, and rule types shared by every pass.

pub mod tiers;

use serde::{Deserialize, Serialize};

use crate::parser::pattern::Pattern;

/// The permission action a rule carries.
///
/// Variants are ordered by evaluation priority: `Allow < Ask < Deny`.
/// When more than one rule matches a command, the highest-priority action
/// wins regardless of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Command runs without confirmation
    Allow,

    /// User is prompted before the command runs
    Ask,

    /// Command is blocked outright
    Deny,
}

impl Action {
    /// Lowercase string for JSON output
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::Ask => "ask",
            Action::Deny => "deny",
        }
    }

    /// Parse from a settings-file section key
    pub fn from_key(s: &str) -> Option<Self> {
        match s {
            "allow" => Some(Action::Allow),
            "ask" => Some(Action::Ask),
            "deny" => Some(Action::Deny),
            _ => None,
        }
    }
}

/// The configuration layer a rule originates from.
///
/// Ordered by specificity: `User < ProjectShared < ProjectLocal`. Within
/// equal action priority, the most specific scope wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// `~/.claude/settings.json`
    User,

    /// `.claude/settings.json`, checked into the repository
    ProjectShared,

    /// `.claude/settings.local.json`, per-checkout
    ProjectLocal,
}

impl Scope {
    /// Snake-case string for JSON output
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::ProjectShared => "project_shared",
            Scope::ProjectLocal => "project_local",
        }
    }

    /// All scopes, broadest first
    pub fn all() -> [Scope; 3] {
        [Scope::User, Scope::ProjectShared, Scope::ProjectLocal]
    }
}

/// A parsed permission rule.
///
/// Rules are immutable values: every pass reads them and produces new
/// derived data, nothing mutates a rule after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub action: Action,
    pub tool: String,
    pub pattern: Pattern,
    pub scope: Scope,
}

impl Rule {
    pub fn new(action: Action, tool: impl Into<String>, pattern: Pattern, scope: Scope) -> Self {
        Self {
            action,
            tool: tool.into(),
            pattern,
            scope,
        }
    }

    /// Render back to the settings-file syntax, e.g. `Bash(git diff *)`
    pub fn render(&self) -> String {
        if self.pattern.is_full() {
            self.tool.clone()
        } else {
            format!("{}({})", self.tool, self.pattern.render_spec())
        }
    }

    /// True when this rule matches the given command of its tool
    pub fn matches(&self, command: &str) -> bool {
        self.pattern.matches(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::pattern::Pattern;

    #[test]
    fn test_action_priority_order() {
        assert!(Action::Allow < Action::Ask);
        assert!(Action::Ask < Action::Deny);
    }

    #[test]
    fn test_scope_specificity_order() {
        assert!(Scope::User < Scope::ProjectShared);
        assert!(Scope::ProjectShared < Scope::ProjectLocal);
    }

    #[test]
    fn test_action_from_key() {
        assert_eq!(Action::from_key("allow"), Some(Action::Allow));
        assert_eq!(Action::from_key("ask"), Some(Action::Ask));
        assert_eq!(Action::from_key("deny"), Some(Action::Deny));
        assert_eq!(Action::from_key("Allow"), None);
    }

    #[test]
    fn test_rule_render() {
        let rule = Rule::new(
            Action::Allow,
            "Bash",
            Pattern::exact("git status"),
            Scope::User,
        );
        assert_eq!(rule.render(), "Bash(git status)");

        let rule = Rule::new(Action::Deny, "WebFetch", Pattern::full(), Scope::User);
        assert_eq!(rule.render(), "WebFetch");
    }
}
