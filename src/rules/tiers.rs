//! Risk tier classification for consolidation proposals
//!
//! A fixed table bounds which consolidations may be automatic: Tier 1
//! proposals are safe to apply, Tier 2 needs a prior confirmation signal,
//! Tier 3 is never auto-consolidated.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::parser::pattern::{Pattern, PatternKind};

/// Risk tier for a proposed change
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Duplicate removal, whitespace trim, benign flag-variant merges
    Low,

    /// Network commands, package installs, scope moves
    Medium,

    /// Privilege escalation, destructive filesystem ops, unscoped wildcards
    High,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Medium => "medium",
            Tier::High => "high",
        }
    }
}

/// A tier classification rule
#[derive(Debug, Clone)]
pub struct TierRule {
    /// Unique identifier for this rule
    pub id: &'static str,

    /// Tier assigned when the pattern matches
    pub tier: Tier,

    /// Regex matched against the pattern's literal command text
    pub pattern: &'static str,

    /// Human-readable classification reason
    pub reason: &'static str,
}

impl TierRule {
    pub const fn new(id: &'static str, tier: Tier, pattern: &'static str, reason: &'static str) -> Self {
        Self {
            id,
            tier,
            pattern,
            reason,
        }
    }
}

/// High-risk primitives: never auto-consolidated
pub const HIGH_RULES: &[TierRule] = &[
    TierRule::new(
        "privilege-escalation",
        Tier::High,
        r"^(sudo|su|doas)\b",
        "Privilege escalation command",
    ),
    TierRule::new(
        "rm-recursive",
        Tier::High,
        r"^rm\s+(-[a-zA-Z]*[rf][a-zA-Z]*\s*)+",
        "Recursive or forced file deletion",
    ),
    TierRule::new(
        "disk-write",
        Tier::High,
        r"^(dd|mkfs\b|mkfs\.|fdisk|parted)",
        "Direct disk or partition operation",
    ),
    TierRule::new(
        "chmod-world-writable",
        Tier::High,
        r"^chmod\s+([0-7]*7[0-7]*7|777|a\+w)",
        "World-writable permission change",
    ),
    TierRule::new(
        "shell-eval",
        Tier::High,
        r"^(eval|exec)\b",
        "Dynamic shell evaluation",
    ),
    TierRule::new(
        "power-control",
        Tier::High,
        r"^(shutdown|reboot|halt|poweroff)\b",
        "System power control",
    ),
];

/// Medium-risk commands: consolidation needs a prior confirmation signal
pub const MEDIUM_RULES: &[TierRule] = &[
    TierRule::new(
        "network-client",
        Tier::Medium,
        r"^(curl|wget|nc|ncat|ssh|scp|sftp|rsync|ftp|telnet)\b",
        "Network command",
    ),
    TierRule::new(
        "package-install",
        Tier::Medium,
        r"^(npm|pnpm|yarn)\s+(install|add|i)\b",
        "Package install",
    ),
    TierRule::new(
        "pip-install",
        Tier::Medium,
        r"^(pip3?|uv)\s+(install|add)\b",
        "Package install",
    ),
    TierRule::new(
        "cargo-install",
        Tier::Medium,
        r"^cargo\s+(install|add)\b",
        "Package install",
    ),
    TierRule::new(
        "system-package",
        Tier::Medium,
        r"^(apt|apt-get|dnf|yum|pacman|brew|apk)\b",
        "System package manager",
    ),
    TierRule::new(
        "git-push",
        Tier::Medium,
        r"^git\s+push\b",
        "Pushes to a remote",
    ),
];

/// Tools whose full wildcard is a high-risk unscoped grant
const FULL_WILDCARD_HIGH: &[&str] = &["Bash", "Write", "Edit", "MultiEdit", "NotebookEdit"];

/// Classify a tool/pattern combination.
///
/// Returns the tier plus the classification reason. Prefix patterns are
/// classified by their literal prefix: a wildcard can only broaden what
/// the prefix already names, so the prefix carries the risk.
pub fn classify(tool: &str, pattern: &Pattern) -> (Tier, String) {
    if pattern.kind == PatternKind::Full {
        if FULL_WILDCARD_HIGH.contains(&tool) {
            return (
                Tier::High,
                format!("Unscoped wildcard over all {} invocations", tool),
            );
        }
        return (
            Tier::Medium,
            format!("Wildcard over all {} invocations", tool),
        );
    }

    // Non-command tools (file paths, URLs) have no command grammar to
    // classify; path and URL patterns sit at the low tier
    if tool != "Bash" {
        return (Tier::Low, "Non-command pattern".to_string());
    }

    static HIGH_REGEXES: Lazy<Vec<Regex>> =
        Lazy::new(|| HIGH_RULES.iter().map(|r| Regex::new(r.pattern).unwrap()).collect());
    static MEDIUM_REGEXES: Lazy<Vec<Regex>> =
        Lazy::new(|| MEDIUM_RULES.iter().map(|r| Regex::new(r.pattern).unwrap()).collect());

    let text = pattern.literal();

    for (rule, re) in HIGH_RULES.iter().zip(HIGH_REGEXES.iter()) {
        if re.is_match(text) {
            return (rule.tier, rule.reason.to_string());
        }
    }
    for (rule, re) in MEDIUM_RULES.iter().zip(MEDIUM_REGEXES.iter()) {
        if re.is_match(text) {
            return (rule.tier, rule.reason.to_string());
        }
    }

    (Tier::Low, "No elevated-risk primitive".to_string())
}

/// The first command word of a pattern's literal text, if any.
/// Uses shlex so quoted segments don't split.
pub fn base_command(pattern: &Pattern) -> Option<String> {
    shlex::split(pattern.literal())?.into_iter().next()
}
