//! Report types for reconciliation results
//!
//! Everything the reconciler produces is data in a `ReconcileReport`:
//! normalized rule sets, findings, conflicts, consolidation candidates,
//! and a plan record per proposed change. Nothing is ever applied.

use serde::Serialize;

use crate::rules::tiers::Tier;
use crate::rules::{Action, Rule, Scope};

/// A reference to a rule in its source layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleRef {
    pub scope: Scope,
    pub action: Action,

    /// Rendered settings-file syntax, e.g. `Bash(git diff *)`
    pub rule: String,
}

impl RuleRef {
    pub fn from_rule(rule: &Rule) -> Self {
        Self {
            scope: rule.scope,
            action: rule.action,
            rule: rule.render(),
        }
    }
}

/// Kind of a non-fatal finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Malformed pattern or unknown tool; excluded from matching
    InvalidRule,

    /// A candidate group failed a consolidation safety criterion
    AmbiguousConsolidation,

    /// Two scope files resolve to the same underlying store
    ScopeAliasDetected,
}

/// A non-fatal finding surfaced for human review
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub kind: FindingKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,

    /// The rule string(s) involved, as written in the source
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<String>,

    pub detail: String,
}

impl Finding {
    pub fn invalid_rule(scope: Scope, raw: &str, detail: impl Into<String>) -> Self {
        Self {
            kind: FindingKind::InvalidRule,
            scope: Some(scope),
            rules: vec![raw.to_string()],
            detail: detail.into(),
        }
    }

    pub fn ambiguous(scope: Option<Scope>, rules: Vec<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: FindingKind::AmbiguousConsolidation,
            scope,
            rules,
            detail: detail.into(),
        }
    }

    pub fn scope_alias(kept: Scope, dropped: Scope, path: &str) -> Self {
        Self {
            kind: FindingKind::ScopeAliasDetected,
            scope: Some(dropped),
            rules: Vec::new(),
            detail: format!(
                "{} and {} resolve to the same file ({}); {} ignored for this run",
                kept.as_str(),
                dropped.as_str(),
                path,
                dropped.as_str()
            ),
        }
    }
}

/// A rule that is redundant given another rule
#[derive(Debug, Clone, Serialize)]
pub struct Duplicate {
    /// The copy that stays
    pub keep: RuleRef,

    /// The removal candidate
    pub remove: RuleRef,

    pub reason: String,
}

/// How a conflict resolves under the evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Scope precedence alone decides
    HigherScopeWins,

    /// Action priority overrides scope specificity, or the rules share
    /// a scope; surfaced for human review
    ManualReviewRequired,
}

/// Two rules with different effective outcomes for overlapping commands.
///
/// The resolution is recorded, never silently applied.
#[derive(Debug, Clone, Serialize)]
pub struct Conflict {
    /// The rule that wins under deny > ask > allow, then scope
    pub winner: RuleRef,

    /// The rule it overrides
    pub loser: RuleRef,

    /// The effective action for the overlapping command space
    pub effective: Action,

    pub resolution: ConflictResolution,

    pub detail: String,
}

/// A proposed wildcard rule subsuming narrower source rules
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidationCandidate {
    pub action: Action,
    pub tool: String,

    /// Rendered candidate, e.g. `Bash(git diff *)`
    pub rule: String,

    /// Target scope (equal-or-tighter than every subsumed rule's)
    pub scope: Scope,

    pub subsumes: Vec<RuleRef>,

    pub risk: Tier,

    /// True when the tier allows applying without further confirmation
    pub auto: bool,

    pub reason: String,
}

/// What a plan record proposes to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    /// Safe-transform rewrite of a rule string
    Rewrite,

    /// Remove a redundant copy
    RemoveDuplicate,

    /// Replace narrow rules with one wildcard
    Consolidate,
}

/// One proposed change, for an external authority to apply
#[derive(Debug, Clone, Serialize)]
pub struct PlanRecord {
    pub action: PlanAction,

    /// The resulting rule string (for removals, the removed rule)
    pub rule: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_scope: Option<Scope>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_scope: Option<Scope>,

    pub reason: String,

    pub risk: Tier,
}

/// Normalized rule strings for one scope, in input order
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizedScope {
    pub allow: Vec<String>,
    pub ask: Vec<String>,
    pub deny: Vec<String>,
}

/// The complete result of one reconciliation run
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub user: NormalizedScope,
    pub project_shared: NormalizedScope,
    pub project_local: NormalizedScope,

    pub findings: Vec<Finding>,
    pub duplicates: Vec<Duplicate>,
    pub conflicts: Vec<Conflict>,
    pub candidates: Vec<ConsolidationCandidate>,
    pub plan: Vec<PlanRecord>,
}

impl ReconcileReport {
    pub fn normalized(&self, scope: Scope) -> &NormalizedScope {
        match scope {
            Scope::User => &self.user,
            Scope::ProjectShared => &self.project_shared,
            Scope::ProjectLocal => &self.project_local,
        }
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Human-readable summary for terminal output
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        for scope in Scope::all() {
            let set = self.normalized(scope);
            let count = set.allow.len() + set.ask.len() + set.deny.len();
            out.push_str(&format!("{}: {} rule(s)\n", scope.as_str(), count));
        }

        if !self.findings.is_empty() {
            out.push_str(&format!("\nfindings ({}):\n", self.findings.len()));
            for f in &self.findings {
                out.push_str(&format!("  [{:?}] {}\n", f.kind, f.detail));
            }
        }

        if !self.duplicates.is_empty() {
            out.push_str(&format!("\nduplicates ({}):\n", self.duplicates.len()));
            for d in &self.duplicates {
                out.push_str(&format!(
                    "  {} @ {} (kept @ {}): {}\n",
                    d.remove.rule,
                    d.remove.scope.as_str(),
                    d.keep.scope.as_str(),
                    d.reason
                ));
            }
        }

        if !self.conflicts.is_empty() {
            out.push_str(&format!("\nconflicts ({}):\n", self.conflicts.len()));
            for c in &self.conflicts {
                out.push_str(&format!(
                    "  {} {} @ {} overrides {} {} @ {} -> {}\n",
                    c.winner.action.as_str(),
                    c.winner.rule,
                    c.winner.scope.as_str(),
                    c.loser.action.as_str(),
                    c.loser.rule,
                    c.loser.scope.as_str(),
                    c.effective.as_str()
                ));
            }
        }

        if !self.candidates.is_empty() {
            out.push_str(&format!("\nconsolidations ({}):\n", self.candidates.len()));
            for c in &self.candidates {
                out.push_str(&format!(
                    "  {} @ {} subsumes {} rule(s) [{}{}]: {}\n",
                    c.rule,
                    c.scope.as_str(),
                    c.subsumes.len(),
                    c.risk.as_str(),
                    if c.auto { "" } else { ", needs confirmation" },
                    c.reason
                ));
            }
        }

        if !self.plan.is_empty() {
            out.push_str(&format!("\nplan ({}):\n", self.plan.len()));
            for p in &self.plan {
                out.push_str(&format!(
                    "  {:?} {} [{}]: {}\n",
                    p.action,
                    p.rule,
                    p.risk.as_str(),
                    p.reason
                ));
            }
        }

        out
    }
}
