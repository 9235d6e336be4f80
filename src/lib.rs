//! claude-reconcile - Permission rule reconciler for Claude Code settings
//!
//! This library reads the permission rules from the three Claude Code
//! settings layers (user, project shared, project local) and produces a
//! normalized rule set, a conflict report, and consolidation proposals
//! that never widen the effective permission surface.
//!
//! # Features
//!
//! - **Safe normalization**: whitespace trim and legacy wildcard rewrite,
//!   never a semantic change
//! - **Duplicate detection**: exact and cross-scope redundant rules
//! - **Conflict resolution**: deny > ask > allow, then the most specific
//!   scope; every override is surfaced for review
//! - **Consolidation proposals**: narrow rules replaceable by one
//!   wildcard, bounded by a fixed risk-tier table
//! - **Audit logging**: JSONL log of every run and proposal
//!
//! # Example
//!
//! ```
//! use claude_reconcile::{Config, Reconciler, ReconcileInput};
//!
//! let input = ReconcileInput::from_json(
//!     r#"{"project_shared": {"allow": ["Bash(git diff)", "Bash(git diff --stat)"]}}"#,
//! ).unwrap();
//!
//! let engine = Reconciler::new(Config::default());
//! let report = engine.reconcile(&input);
//!
//! assert_eq!(report.candidates.len(), 1);
//! assert_eq!(report.candidates[0].rule, "Bash(git diff *)");
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod input;
pub mod parser;
pub mod report;
pub mod rules;

// Re-exports for convenience
pub use config::Config;
pub use engine::conflict::effective_action;
pub use engine::Reconciler;
pub use input::{PermissionSet, ReconcileInput};
pub use report::{Conflict, ConsolidationCandidate, Finding, PlanRecord, ReconcileReport};
pub use rules::tiers::Tier;
pub use rules::{Action, Rule, Scope};
