//! Reconciliation engine for claude-reconcile
//!
//! Coordinates the passes: normalize, parse, duplicate detection,
//! conflict resolution, and consolidation proposals.

pub mod conflict;
pub mod consolidate;
pub mod dedupe;
pub mod normalize;

use std::env;

use crate::config::Config;
use crate::input::ReconcileInput;
use crate::parser::pattern;
use crate::report::{
    Finding, NormalizedScope, PlanAction, PlanRecord, ReconcileReport,
};
use crate::rules::tiers::Tier;
use crate::rules::{Action, Rule, Scope};

/// The main reconciliation engine.
///
/// A pure function over the three input rule lists: inputs are never
/// mutated and every proposed change is data in the report.
pub struct Reconciler {
    config: Config,
}

impl Reconciler {
    /// Create a new reconciler with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Whether medium-tier consolidations carry a prior confirmation
    /// signal (config or environment)
    pub fn medium_allowed(&self) -> bool {
        self.config.consolidation.allow_medium || env::var("RECONCILE_MEDIUM_OK").is_ok()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Main entry point: reconcile the three scope layers into a report
    pub fn reconcile(&self, input: &ReconcileInput) -> ReconcileReport {
        let mut findings = Vec::new();
        let mut plan = Vec::new();

        for alias in &input.aliases {
            findings.push(Finding::scope_alias(alias.kept, alias.dropped, &alias.path));
        }

        let (rules, normalized) = self.parse_input(input, &mut findings, &mut plan);

        let duplicates = dedupe::find_duplicates(&rules);
        for dup in &duplicates {
            plan.push(PlanRecord {
                action: PlanAction::RemoveDuplicate,
                rule: dup.remove.rule.clone(),
                from_scope: Some(dup.remove.scope),
                to_scope: None,
                reason: dup.reason.clone(),
                risk: Tier::Low,
            });
        }

        let conflicts = conflict::resolve_conflicts(&rules);

        let mut candidates = Vec::new();
        if self.config.consolidation.enabled {
            let outcome = consolidate::propose(&rules, self.medium_allowed());
            findings.extend(outcome.findings);
            for candidate in &outcome.candidates {
                let from_scope = uniform_scope(candidate);
                plan.push(PlanRecord {
                    action: PlanAction::Consolidate,
                    rule: candidate.rule.clone(),
                    from_scope,
                    to_scope: Some(candidate.scope),
                    reason: candidate.reason.clone(),
                    risk: candidate.risk,
                });
            }
            candidates = outcome.candidates;
        }

        let [user, project_shared, project_local] = normalized;
        ReconcileReport {
            user,
            project_shared,
            project_local,
            findings,
            duplicates,
            conflicts,
            candidates,
            plan,
        }
    }

    /// Resolve the effective action for one command under the full rule
    /// set: `deny > ask > allow`, then the most specific scope
    pub fn effective_action(
        &self,
        input: &ReconcileInput,
        tool: &str,
        command: &str,
    ) -> Option<Action> {
        let mut findings = Vec::new();
        let mut plan = Vec::new();
        let (rules, _) = self.parse_input(input, &mut findings, &mut plan);
        conflict::effective_action(&rules, tool, command)
    }

    /// Normalize and parse every rule string. Malformed rules become
    /// findings and are excluded from matching, but stay in the
    /// normalized output: they are still in the file, and dropping them
    /// silently is not this tool's call.
    fn parse_input(
        &self,
        input: &ReconcileInput,
        findings: &mut Vec<Finding>,
        plan: &mut Vec<PlanRecord>,
    ) -> (Vec<Rule>, [NormalizedScope; 3]) {
        let mut rules = Vec::new();
        let mut normalized: [NormalizedScope; 3] = Default::default();

        for (idx, scope) in Scope::all().into_iter().enumerate() {
            let set = input.scope(scope);
            let sections = [
                (Action::Allow, &set.allow),
                (Action::Ask, &set.ask),
                (Action::Deny, &set.deny),
            ];

            for (action, raws) in sections {
                for raw in raws {
                    let norm = normalize::normalize(raw);
                    if norm.changed() {
                        plan.push(PlanRecord {
                            action: PlanAction::Rewrite,
                            rule: norm.text.clone(),
                            from_scope: Some(scope),
                            to_scope: None,
                            reason: format!(
                                "rewrote {:?} ({})",
                                raw,
                                norm.transforms.join(", ")
                            ),
                            risk: Tier::Low,
                        });
                    }

                    let out = &mut normalized[idx];
                    match action {
                        Action::Allow => out.allow.push(norm.text.clone()),
                        Action::Ask => out.ask.push(norm.text.clone()),
                        Action::Deny => out.deny.push(norm.text.clone()),
                    }

                    match pattern::parse_rule(&norm.text, &self.config.tools.known) {
                        Ok((tool, pat)) => {
                            rules.push(Rule::new(action, tool, pat, scope));
                        }
                        Err(e) => {
                            findings.push(Finding::invalid_rule(scope, raw, e.to_string()));
                        }
                    }
                }
            }
        }

        (rules, normalized)
    }
}

/// The common source scope of a candidate's subsumed rules, if they
/// agree
fn uniform_scope(candidate: &crate::report::ConsolidationCandidate) -> Option<Scope> {
    let mut scopes = candidate.subsumes.iter().map(|r| r.scope);
    let first = scopes.next()?;
    if scopes.all(|s| s == first) {
        Some(first)
    } else {
        None
    }
}
