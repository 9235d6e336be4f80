//! Conflict detection and effective-action resolution
//!
//! The evaluation order is action-priority first: `deny` beats `ask`
//! beats `allow` for any command both match, regardless of scope. Within
//! equal action priority the most specific scope wins
//! (`project_local > project_shared > user`).

use crate::report::{Conflict, ConflictResolution, RuleRef};
use crate::rules::{Action, Rule};

/// Resolve the effective action for a command under the full rule set.
/// Returns `None` when no rule matches.
pub fn effective_action(rules: &[Rule], tool: &str, command: &str) -> Option<Action> {
    rules
        .iter()
        .filter(|r| r.tool == tool && r.matches(command))
        .max_by_key(|r| (r.action, r.scope))
        .map(|r| r.action)
}

/// Emit a `Conflict` for every pair of rules with different actions over
/// an overlapping command space. The resolution is recorded for review,
/// never applied.
pub fn resolve_conflicts(rules: &[Rule]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for i in 0..rules.len() {
        for j in (i + 1)..rules.len() {
            let (a, b) = (&rules[i], &rules[j]);
            if a.tool != b.tool || a.action == b.action {
                continue;
            }
            if !a.pattern.overlaps(&b.pattern) {
                continue;
            }

            let (winner, loser) = if (a.action, a.scope) >= (b.action, b.scope) {
                (a, b)
            } else {
                (b, a)
            };

            let resolution = if winner.scope > loser.scope {
                // The more specific scope also carries the winning action
                ConflictResolution::HigherScopeWins
            } else {
                // Action priority overrides scope specificity, or both
                // rules sit in one scope
                ConflictResolution::ManualReviewRequired
            };

            let detail = format!(
                "{} {} at {} and {} {} at {} overlap; effective action is {}",
                winner.action.as_str(),
                winner.render(),
                winner.scope.as_str(),
                loser.action.as_str(),
                loser.render(),
                loser.scope.as_str(),
                winner.action.as_str(),
            );

            conflicts.push(Conflict {
                winner: RuleRef::from_rule(winner),
                loser: RuleRef::from_rule(loser),
                effective: winner.action,
                resolution,
                detail,
            });
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::pattern::Pattern;
    use crate::rules::Scope;

    fn rule(action: Action, pattern: Pattern, scope: Scope) -> Rule {
        Rule::new(action, "Bash", pattern, scope)
    }

    #[test]
    fn test_deny_beats_allow_across_scopes() {
        // Deny at the broader scope still wins on action priority
        let rules = vec![
            rule(Action::Deny, Pattern::boundary_prefix("sudo"), Scope::User),
            rule(
                Action::Allow,
                Pattern::exact("sudo systemctl restart nginx"),
                Scope::ProjectShared,
            ),
        ];

        assert_eq!(
            effective_action(&rules, "Bash", "sudo systemctl restart nginx"),
            Some(Action::Deny)
        );

        let conflicts = resolve_conflicts(&rules);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].effective, Action::Deny);
        assert_eq!(
            conflicts[0].resolution,
            ConflictResolution::ManualReviewRequired
        );
    }

    #[test]
    fn test_deny_beats_ask() {
        let rules = vec![
            rule(Action::Ask, Pattern::bare_prefix("git push"), Scope::ProjectLocal),
            rule(Action::Deny, Pattern::exact("git push --force"), Scope::User),
        ];
        assert_eq!(
            effective_action(&rules, "Bash", "git push --force"),
            Some(Action::Deny)
        );
    }

    #[test]
    fn test_ask_beats_allow() {
        let rules = vec![
            rule(Action::Allow, Pattern::bare_prefix("npm"), Scope::ProjectLocal),
            rule(Action::Ask, Pattern::exact("npm publish"), Scope::User),
        ];
        assert_eq!(
            effective_action(&rules, "Bash", "npm publish"),
            Some(Action::Ask)
        );
    }

    #[test]
    fn test_scope_precedence_within_equal_action() {
        let rules = vec![
            rule(Action::Allow, Pattern::exact("git status"), Scope::User),
            rule(Action::Allow, Pattern::exact("git status"), Scope::ProjectLocal),
        ];
        let winner = rules
            .iter()
            .filter(|r| r.matches("git status"))
            .max_by_key(|r| (r.action, r.scope))
            .unwrap();
        assert_eq!(winner.scope, Scope::ProjectLocal);
    }

    #[test]
    fn test_higher_scope_wins_tag() {
        // The specific scope carries the stronger action: both criteria
        // point the same way
        let rules = vec![
            rule(Action::Allow, Pattern::bare_prefix("npm"), Scope::User),
            rule(
                Action::Deny,
                Pattern::exact("npm publish"),
                Scope::ProjectLocal,
            ),
        ];
        let conflicts = resolve_conflicts(&rules);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].resolution, ConflictResolution::HigherScopeWins);
        assert_eq!(conflicts[0].winner.scope, Scope::ProjectLocal);
    }

    #[test]
    fn test_same_scope_conflict_needs_review() {
        let rules = vec![
            rule(Action::Allow, Pattern::bare_prefix("curl"), Scope::ProjectShared),
            rule(Action::Deny, Pattern::exact("curl evil.com"), Scope::ProjectShared),
        ];
        let conflicts = resolve_conflicts(&rules);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts[0].resolution,
            ConflictResolution::ManualReviewRequired
        );
    }

    #[test]
    fn test_no_conflict_without_overlap() {
        let rules = vec![
            rule(Action::Allow, Pattern::exact("git status"), Scope::User),
            rule(Action::Deny, Pattern::exact("rm -rf /"), Scope::User),
        ];
        assert!(resolve_conflicts(&rules).is_empty());
    }

    #[test]
    fn test_no_conflict_across_tools() {
        let rules = vec![
            Rule::new(Action::Allow, "Read", Pattern::full(), Scope::User),
            Rule::new(Action::Deny, "Bash", Pattern::full(), Scope::User),
        ];
        assert!(resolve_conflicts(&rules).is_empty());
    }

    #[test]
    fn test_no_match_is_none() {
        let rules = vec![rule(Action::Allow, Pattern::exact("ls"), Scope::User)];
        assert_eq!(effective_action(&rules, "Bash", "pwd"), None);
    }
}
