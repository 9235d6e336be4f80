//! Duplicate and redundancy detection
//!
//! Flags exact duplicates within a scope, rules covered by a same-action
//! wildcard at the same scope, and cross-scope copies with no
//! scope-precedence reason to keep them. Removal is proposed, never
//! performed.

use std::collections::HashSet;

use crate::report::{Duplicate, RuleRef};
use crate::rules::Rule;

/// Find redundant rules. Returns one `Duplicate` per removal candidate;
/// a rule is flagged at most once.
pub fn find_duplicates(rules: &[Rule]) -> Vec<Duplicate> {
    let mut flagged: HashSet<usize> = HashSet::new();
    let mut duplicates = Vec::new();

    // Exact duplicates within one scope: first occurrence stays
    let mut seen: HashSet<(String, String)> = HashSet::new();
    for (i, rule) in rules.iter().enumerate() {
        let key = (rule.scope.as_str().to_string(), identity(rule));
        if !seen.insert(key) {
            flagged.insert(i);
            duplicates.push(Duplicate {
                keep: RuleRef::from_rule(rule),
                remove: RuleRef::from_rule(rule),
                reason: "exact duplicate within the same scope".to_string(),
            });
        }
    }

    for (i, narrow) in rules.iter().enumerate() {
        if flagged.contains(&i) {
            continue;
        }
        for (j, broad) in rules.iter().enumerate() {
            if i == j || flagged.contains(&j) {
                continue;
            }
            if narrow.action != broad.action || narrow.tool != broad.tool {
                continue;
            }

            if narrow.scope == broad.scope {
                // Same scope: strictly covered rules are always redundant
                if broad.pattern != narrow.pattern && broad.pattern.covers(&narrow.pattern) {
                    flagged.insert(i);
                    duplicates.push(Duplicate {
                        keep: RuleRef::from_rule(broad),
                        remove: RuleRef::from_rule(narrow),
                        reason: format!("covered by {} at the same scope", broad.render()),
                    });
                    break;
                }
                continue;
            }

            // Cross-scope: identical copies flag the less specific one;
            // covered copies flag the narrow one. Either way a rule of a
            // different action overlapping the candidate is a precedence
            // reason to keep it.
            let identical = broad.pattern == narrow.pattern;
            let covered = !identical && broad.pattern.covers(&narrow.pattern);
            if !identical && !covered {
                continue;
            }
            if identical && narrow.scope > broad.scope {
                // The broader-scope copy is the removal candidate; handled
                // when the loop reaches it
                continue;
            }
            if has_precedence_reason(rules, narrow) {
                continue;
            }

            let reason = if identical {
                format!(
                    "identical rule exists at {}; less specific copy is redundant",
                    broad.scope.as_str()
                )
            } else {
                format!("covered by {} at {}", broad.render(), broad.scope.as_str())
            };
            flagged.insert(i);
            duplicates.push(Duplicate {
                keep: RuleRef::from_rule(broad),
                remove: RuleRef::from_rule(narrow),
                reason,
            });
            break;
        }
    }

    duplicates
}

/// A different-action rule overlapping the candidate means removing it
/// could change which rule decides some command
fn has_precedence_reason(rules: &[Rule], candidate: &Rule) -> bool {
    rules.iter().any(|other| {
        other.tool == candidate.tool
            && other.action != candidate.action
            && other.pattern.overlaps(&candidate.pattern)
    })
}

fn identity(rule: &Rule) -> String {
    format!("{}:{}", rule.action.as_str(), rule.render())
}
