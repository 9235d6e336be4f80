//! Consolidation proposals
//!
//! Proposes replacing several narrow rules with one wildcard, only when
//! the wildcard cannot widen what the rule set already matched. Two
//! shapes qualify:
//!
//! - an existing wildcard in the group already covers every other member
//!   (the candidate is that wildcard, subsuming the rest), or
//! - every member is one base command plus flag-only variations
//!   (`git diff`, `git diff --stat`), in which case `base *` names the
//!   same command; positional-argument variations (`git push` vs
//!   `git push origin main`) are distinct commands and are never merged
//!   automatically.
//!
//! Groups that look mergeable but fail a safety criterion are reported
//! as `manual_review_required` with the original rules untouched.

use std::collections::BTreeMap;

use crate::parser::pattern::{Pattern, PatternKind};
use crate::report::{ConsolidationCandidate, Finding, RuleRef};
use crate::rules::tiers::{self, Tier};
use crate::rules::{Action, Rule, Scope};

/// Result of the consolidation pass
#[derive(Debug, Default)]
pub struct ConsolidationOutcome {
    pub candidates: Vec<ConsolidationCandidate>,
    pub findings: Vec<Finding>,
}

/// Propose consolidations across the full rule set.
///
/// `medium_allowed` is the prior confirmation signal: medium-tier
/// candidates are still proposed without it, but marked non-automatic.
pub fn propose(rules: &[Rule], medium_allowed: bool) -> ConsolidationOutcome {
    let mut outcome = ConsolidationOutcome::default();

    // Group by action and tool; scope is a criterion, not a group key
    let mut groups: BTreeMap<(Action, String), Vec<&Rule>> = BTreeMap::new();
    for rule in rules {
        groups
            .entry((rule.action, rule.tool.clone()))
            .or_default()
            .push(rule);
    }

    for ((action, tool), members) in groups {
        if members.len() < 2 {
            continue;
        }
        consolidate_group(action, &tool, &members, rules, medium_allowed, &mut outcome);
    }

    outcome
}

fn consolidate_group(
    action: Action,
    tool: &str,
    members: &[&Rule],
    all_rules: &[Rule],
    medium_allowed: bool,
    outcome: &mut ConsolidationOutcome,
) {
    // Shape 1: an existing wildcard covers everything else
    if let Some((wildcard, subsumed)) = covering_wildcard(members) {
        finish_candidate(
            action,
            tool,
            wildcard.pattern.clone(),
            wildcard.scope,
            subsumed,
            format!(
                "existing wildcard {} already covers the narrower rules",
                wildcard.render()
            ),
            all_rules,
            medium_allowed,
            outcome,
        );
        return;
    }

    // Shape 2: flag-only variations of one base command
    if members.iter().any(|m| m.pattern.kind != PatternKind::Exact) {
        return;
    }
    match flag_variant_base(members) {
        FlagVariants::NotRelated => {}
        FlagVariants::PositionalArgs { base, others } => {
            // Looks mergeable, but the variants name different commands
            let mut involved: Vec<String> = vec![base.render()];
            involved.extend(others.iter().map(|r| r.render()));
            outcome.findings.push(Finding::ambiguous(
                None,
                involved,
                format!(
                    "variants of '{}' differ in positional arguments; a wildcard would \
                     match commands none of the rules name",
                    base.pattern.literal()
                ),
            ));
        }
        FlagVariants::FlagsOnly { base, variants } => {
            let scope = variants
                .iter()
                .map(|r| r.scope)
                .max()
                .unwrap_or(base.scope);
            finish_candidate(
                action,
                tool,
                Pattern::boundary_prefix(base.pattern.literal()),
                scope,
                variants,
                format!(
                    "members are flag-only variants of '{}'",
                    base.pattern.literal()
                ),
                all_rules,
                medium_allowed,
                outcome,
            );
        }
    }
}

/// Find a member wildcard covering every other member. When several
/// qualify they cover one another, so the first is as narrow as any.
fn covering_wildcard<'a>(members: &[&'a Rule]) -> Option<(&'a Rule, Vec<&'a Rule>)> {
    for (i, candidate) in members.iter().enumerate() {
        if candidate.pattern.kind == PatternKind::Exact {
            continue;
        }
        let rest: Vec<&Rule> = members
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, r)| *r)
            .collect();
        if rest
            .iter()
            .all(|r| candidate.pattern.covers(&r.pattern))
        {
            return Some((*candidate, rest));
        }
    }
    None
}

enum FlagVariants<'a> {
    /// Members don't share a base command; nothing to propose
    NotRelated,

    /// Members extend a base with positional arguments
    PositionalArgs {
        base: &'a Rule,
        others: Vec<&'a Rule>,
    },

    /// Members extend a base with flag tokens only
    FlagsOnly {
        base: &'a Rule,
        variants: Vec<&'a Rule>,
    },
}

/// Classify an all-exact group: is one member a token-prefix of all the
/// others, and are the extra tokens flags?
fn flag_variant_base<'a>(members: &[&'a Rule]) -> FlagVariants<'a> {
    let mut tokenized: Vec<(&'a Rule, Vec<String>)> = Vec::new();
    for member in members.iter().copied() {
        match shlex::split(member.pattern.literal()) {
            Some(tokens) if !tokens.is_empty() => tokenized.push((member, tokens)),
            _ => return FlagVariants::NotRelated,
        }
    }

    tokenized.sort_by_key(|(_, tokens)| tokens.len());
    let (base, base_tokens) = (tokenized[0].0, tokenized[0].1.clone());

    let mut others: Vec<&Rule> = Vec::new();
    let mut flags_only = true;
    for (member, tokens) in &tokenized[1..] {
        // A repeat of the base is dedupe's business, not a variant
        if tokens[..] == base_tokens[..] {
            continue;
        }
        if tokens.len() <= base_tokens.len() || tokens[..base_tokens.len()] != base_tokens[..] {
            return FlagVariants::NotRelated;
        }
        if !tokens[base_tokens.len()..]
            .iter()
            .all(|t| t.starts_with('-'))
        {
            flags_only = false;
        }
        others.push(*member);
    }

    if others.is_empty() {
        FlagVariants::NotRelated
    } else if !flags_only {
        FlagVariants::PositionalArgs { base, others }
    } else {
        FlagVariants::FlagsOnly {
            base,
            variants: others,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn finish_candidate(
    action: Action,
    tool: &str,
    pattern: Pattern,
    scope: Scope,
    subsumed: Vec<&Rule>,
    mut reason: String,
    all_rules: &[Rule],
    medium_allowed: bool,
    outcome: &mut ConsolidationOutcome,
) {
    let rendered = render(tool, &pattern);
    let involved = || -> Vec<String> {
        let mut v = vec![rendered.clone()];
        v.extend(subsumed.iter().map(|r| r.render()));
        v
    };

    // Risk ceiling: high-risk primitives are never auto-consolidated
    let (mut risk, tier_reason) = tiers::classify(tool, &pattern);
    if risk == Tier::High {
        outcome.findings.push(Finding::ambiguous(
            Some(scope),
            involved(),
            format!("{}; never auto-consolidated", tier_reason),
        ));
        return;
    }

    // Scope uniformity: one source scope, or a target at least as tight
    // as every source
    let scopes: Vec<Scope> = subsumed.iter().map(|r| r.scope).collect();
    let uniform = scopes.windows(2).all(|w| w[0] == w[1]);
    if !uniform && scopes.iter().any(|s| *s > scope) {
        outcome.findings.push(Finding::ambiguous(
            Some(scope),
            involved(),
            "subsumed rules span scopes tighter than the candidate's".to_string(),
        ));
        return;
    }
    if !uniform {
        // Folding rules from several scopes into one is a scope move
        risk = risk.max(Tier::Medium);
        reason.push_str("; folds rules from a broader scope");
    }

    // Non-weakening: a deny at an equal-or-broader scope overlapping the
    // candidate means the wildcard could silently contradict it
    if action != Action::Deny {
        let contradicted = all_rules.iter().find(|r| {
            r.action == Action::Deny
                && r.tool == tool
                && r.scope <= scope
                && r.pattern.overlaps(&pattern)
                && !subsumed.iter().any(|s| s.pattern.covers(&r.pattern))
        });
        if let Some(deny) = contradicted {
            outcome.findings.push(Finding::ambiguous(
                Some(scope),
                involved(),
                format!(
                    "would overlap {} at {}; widening must not contradict a deny",
                    deny.render(),
                    deny.scope.as_str()
                ),
            ));
            return;
        }
    }

    let auto = match risk {
        Tier::Low => true,
        Tier::Medium => medium_allowed,
        Tier::High => false,
    };

    outcome.candidates.push(ConsolidationCandidate {
        action,
        tool: tool.to_string(),
        rule: rendered,
        scope,
        subsumes: subsumed.iter().map(|r| RuleRef::from_rule(r)).collect(),
        risk,
        auto,
        reason,
    });
}

fn render(tool: &str, pattern: &Pattern) -> String {
    if pattern.is_full() {
        tool.to_string()
    } else {
        format!("{}({})", tool, pattern.render_spec())
    }
}
