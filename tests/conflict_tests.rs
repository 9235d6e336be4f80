//! Integration tests for conflict detection and effective-action order

use claude_reconcile::report::ConflictResolution;
use claude_reconcile::{Action, Config, ReconcileInput, Reconciler, Scope};

fn engine() -> Reconciler {
    Reconciler::new(Config::default())
}

fn input(json: &str) -> ReconcileInput {
    ReconcileInput::from_json(json).unwrap()
}

// ============================================================================
// Action priority: deny > ask > allow
// ============================================================================

#[test]
fn test_deny_overrides_allow_at_more_specific_scope() {
    let input = input(
        r#"{
            "user": {"deny": ["Bash(sudo *)"]},
            "project_shared": {"allow": ["Bash(sudo systemctl restart nginx)"]}
        }"#,
    );
    let engine = engine();

    // Action priority beats scope specificity
    assert_eq!(
        engine.effective_action(&input, "Bash", "sudo systemctl restart nginx"),
        Some(Action::Deny)
    );

    // And the override is surfaced, not silently applied
    let report = engine.reconcile(&input);
    assert_eq!(report.conflicts.len(), 1);
    let c = &report.conflicts[0];
    assert_eq!(c.effective, Action::Deny);
    assert_eq!(c.winner.scope, Scope::User);
    assert_eq!(c.resolution, ConflictResolution::ManualReviewRequired);
}

#[test]
fn test_ask_overrides_allow() {
    let input = input(
        r#"{
            "user": {"ask": ["Bash(git push *)"]},
            "project_local": {"allow": ["Bash(git push origin feature)"]}
        }"#,
    );
    assert_eq!(
        engine().effective_action(&input, "Bash", "git push origin feature"),
        Some(Action::Ask)
    );
}

#[test]
fn test_deny_overrides_ask() {
    let input = input(
        r#"{
            "project_local": {"ask": ["Bash(npm publish *)"]},
            "user": {"deny": ["Bash(npm publish*)"]}
        }"#,
    );
    assert_eq!(
        engine().effective_action(&input, "Bash", "npm publish --access public"),
        Some(Action::Deny)
    );
}

// ============================================================================
// Scope precedence within equal action
// ============================================================================

#[test]
fn test_more_specific_scope_wins_for_equal_actions() {
    // Both allow: no conflict record, local copy decides
    let input = input(
        r#"{
            "user": {"allow": ["Bash(git status)"]},
            "project_local": {"allow": ["Bash(git status)"]}
        }"#,
    );
    let report = engine().reconcile(&input);
    assert!(report.conflicts.is_empty());
    assert_eq!(
        engine().effective_action(&input, "Bash", "git status"),
        Some(Action::Allow)
    );
}

#[test]
fn test_local_deny_over_user_allow_is_higher_scope_wins() {
    let input = input(
        r#"{
            "user": {"allow": ["Bash(npm *)"]},
            "project_local": {"deny": ["Bash(npm publish)"]}
        }"#,
    );
    let report = engine().reconcile(&input);

    assert_eq!(report.conflicts.len(), 1);
    let c = &report.conflicts[0];
    assert_eq!(c.winner.scope, Scope::ProjectLocal);
    assert_eq!(c.resolution, ConflictResolution::HigherScopeWins);
    assert_eq!(
        engine().effective_action(&input, "Bash", "npm publish"),
        Some(Action::Deny)
    );
}

// ============================================================================
// Wildcard form distinctions
// ============================================================================

#[test]
fn test_boundary_wildcard_excludes_joined_words() {
    let input = input(r#"{"user": {"deny": ["Bash(ls *)"]}}"#);
    let engine = engine();

    assert_eq!(
        engine.effective_action(&input, "Bash", "ls -la"),
        Some(Action::Deny)
    );
    // `ls *` does not cover `lsof`, nor bare `ls`
    assert_eq!(engine.effective_action(&input, "Bash", "lsof"), None);
    assert_eq!(engine.effective_action(&input, "Bash", "ls"), None);
}

#[test]
fn test_bare_wildcard_includes_joined_words() {
    let input = input(r#"{"user": {"deny": ["Bash(ls*)"]}}"#);
    let engine = engine();

    assert_eq!(
        engine.effective_action(&input, "Bash", "lsof"),
        Some(Action::Deny)
    );
    assert_eq!(
        engine.effective_action(&input, "Bash", "ls"),
        Some(Action::Deny)
    );
}

#[test]
fn test_full_wildcard_spellings_equivalent() {
    let engine = engine();
    for json in [
        r#"{"user": {"deny": ["Bash"]}}"#,
        r#"{"user": {"deny": ["Bash(*)"]}}"#,
    ] {
        let input = input(json);
        assert_eq!(
            engine.effective_action(&input, "Bash", "anything goes"),
            Some(Action::Deny)
        );
    }
}

// ============================================================================
// Tool isolation
// ============================================================================

#[test]
fn test_rules_only_apply_to_their_tool() {
    let input = input(r#"{"user": {"deny": ["Bash(cat *)"]}}"#);
    let engine = engine();

    assert_eq!(
        engine.effective_action(&input, "Bash", "cat secrets.txt"),
        Some(Action::Deny)
    );
    assert_eq!(engine.effective_action(&input, "Read", "cat secrets.txt"), None);
}

#[test]
fn test_case_sensitive_matching() {
    let input = input(r#"{"user": {"allow": ["Bash(git status)"]}}"#);
    assert_eq!(
        engine().effective_action(&input, "Bash", "Git Status"),
        None
    );
}
