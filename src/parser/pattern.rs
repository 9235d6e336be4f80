//! Permission pattern parsing and matching
//!
//! A rule string is either a bare tool name (`Bash`) or `Tool(spec)`.
//! The spec is an exact command string, a prefix wildcard, or `*`.
//!
//! Two prefix-wildcard forms exist and are never interchangeable:
//!
//! - `git diff *` - the wildcard sits after a space boundary; matches
//!   commands starting with `git diff ` and nothing else.
//! - `git diff*` - the wildcard is appended directly; matches any command
//!   starting with `git diff`, including `git diff` itself and
//!   `git difftool`. (`ls *` excludes `lsof`, `ls*` includes it.)
//!
//! Matching is case-sensitive and exact on all non-wildcard segments, and
//! identical for allow, ask, and deny rules.

use once_cell::sync::Lazy;
use regex::Regex;

/// Built-in tool identifiers accepted without configuration
pub const KNOWN_TOOLS: &[&str] = &[
    "Bash",
    "Read",
    "Edit",
    "MultiEdit",
    "Write",
    "Glob",
    "Grep",
    "WebFetch",
    "WebSearch",
    "Task",
    "NotebookEdit",
    "TodoWrite",
];

static TOOL_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap());

/// How a pattern matches commands of its tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// Matches one command string exactly
    Exact,

    /// `prefix *` - wildcard after a space boundary
    BoundaryPrefix,

    /// `prefix*` - wildcard appended with no boundary
    BarePrefix,

    /// Matches every invocation of the tool (`Tool` or `Tool(*)`)
    Full,
}

/// A parsed pattern: kind plus the literal text it matches against.
///
/// For `Exact` the text is the whole command; for the prefix kinds it is
/// the prefix without the wildcard token; for `Full` it is empty. The
/// text is never reinterpreted after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    pub kind: PatternKind,
    text: String,
}

/// Why a rule string failed to parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// `Tool(spec` or a stray `)`: delimiters do not balance
    UnbalancedDelimiters(String),

    /// Tool name is not an identifier or not a known tool
    UnknownTool(String),

    /// `Tool()`: nothing to match
    EmptySpec(String),

    /// Wildcard anywhere but the end of the spec
    InteriorWildcard(String),
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternError::UnbalancedDelimiters(raw) => {
                write!(f, "unbalanced delimiters in rule: {}", raw)
            }
            PatternError::UnknownTool(tool) => write!(f, "unknown tool identifier: {}", tool),
            PatternError::EmptySpec(raw) => write!(f, "empty pattern spec in rule: {}", raw),
            PatternError::InteriorWildcard(raw) => {
                write!(f, "wildcard is only supported as a suffix: {}", raw)
            }
        }
    }
}

impl std::error::Error for PatternError {}

impl Pattern {
    pub fn exact(text: impl Into<String>) -> Self {
        Self {
            kind: PatternKind::Exact,
            text: text.into(),
        }
    }

    pub fn boundary_prefix(prefix: impl Into<String>) -> Self {
        Self {
            kind: PatternKind::BoundaryPrefix,
            text: prefix.into(),
        }
    }

    pub fn bare_prefix(prefix: impl Into<String>) -> Self {
        Self {
            kind: PatternKind::BarePrefix,
            text: prefix.into(),
        }
    }

    pub fn full() -> Self {
        Self {
            kind: PatternKind::Full,
            text: String::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.kind == PatternKind::Full
    }

    /// The literal text: whole command for `Exact`, prefix for the
    /// wildcard kinds, empty for `Full`
    pub fn literal(&self) -> &str {
        &self.text
    }

    /// Render the spec portion, e.g. `git diff *`
    pub fn render_spec(&self) -> String {
        match self.kind {
            PatternKind::Exact => self.text.clone(),
            PatternKind::BoundaryPrefix => format!("{} *", self.text),
            PatternKind::BarePrefix => format!("{}*", self.text),
            PatternKind::Full => "*".to_string(),
        }
    }

    /// True iff this pattern matches the candidate command
    pub fn matches(&self, command: &str) -> bool {
        match self.kind {
            PatternKind::Exact => command == self.text,
            PatternKind::BoundaryPrefix => {
                command.len() > self.text.len() + 1
                    && command.starts_with(&self.text)
                    && command.as_bytes()[self.text.len()] == b' '
            }
            PatternKind::BarePrefix => command.starts_with(&self.text),
            PatternKind::Full => true,
        }
    }

    /// The prefix every matched command must start with
    fn match_prefix(&self) -> String {
        match self.kind {
            PatternKind::Exact => self.text.clone(),
            PatternKind::BoundaryPrefix => format!("{} ", self.text),
            PatternKind::BarePrefix => self.text.clone(),
            PatternKind::Full => String::new(),
        }
    }

    /// True iff every command matched by `other` is matched by `self`
    pub fn covers(&self, other: &Pattern) -> bool {
        match self.kind {
            PatternKind::Full => true,
            PatternKind::Exact => other.kind == PatternKind::Exact && other.text == self.text,
            PatternKind::BoundaryPrefix | PatternKind::BarePrefix => match other.kind {
                PatternKind::Full => false,
                PatternKind::Exact => self.matches(&other.text),
                // Everything the other wildcard matches starts with its own
                // match prefix; containment reduces to prefix order
                PatternKind::BoundaryPrefix => {
                    other.match_prefix().starts_with(&self.match_prefix())
                }
                PatternKind::BarePrefix => other.text.starts_with(&self.match_prefix()),
            },
        }
    }

    /// True iff some command is matched by both patterns
    pub fn overlaps(&self, other: &Pattern) -> bool {
        if self.kind == PatternKind::Full || other.kind == PatternKind::Full {
            return true;
        }
        if self.kind == PatternKind::Exact {
            return other.matches(&self.text);
        }
        if other.kind == PatternKind::Exact {
            return self.matches(&other.text);
        }
        // Two prefix wildcards overlap iff their match prefixes are
        // prefix-comparable
        let a = self.match_prefix();
        let b = other.match_prefix();
        a.starts_with(&b) || b.starts_with(&a)
    }
}

/// Parse a rule string into `(tool, pattern)`.
///
/// `extra_tools` extends the built-in known-tool list. The input is
/// expected to be normalized already; parsing itself applies no
/// transforms.
pub fn parse_rule(raw: &str, extra_tools: &[String]) -> Result<(String, Pattern), PatternError> {
    let raw = raw.trim();

    let (tool, spec) = match raw.find('(') {
        Some(open) => {
            if !raw.ends_with(')') {
                return Err(PatternError::UnbalancedDelimiters(raw.to_string()));
            }
            let tool = &raw[..open];
            let spec = &raw[open + 1..raw.len() - 1];
            if spec.contains('(') || spec.contains(')') {
                return Err(PatternError::UnbalancedDelimiters(raw.to_string()));
            }
            (tool, Some(spec))
        }
        None => {
            if raw.contains(')') {
                return Err(PatternError::UnbalancedDelimiters(raw.to_string()));
            }
            (raw, None)
        }
    };

    if !TOOL_IDENT.is_match(tool) {
        return Err(PatternError::UnknownTool(tool.to_string()));
    }
    if !KNOWN_TOOLS.contains(&tool) && !extra_tools.iter().any(|t| t == tool) {
        return Err(PatternError::UnknownTool(tool.to_string()));
    }

    let spec = match spec {
        // Bare tool name matches every invocation
        None => return Ok((tool.to_string(), Pattern::full())),
        Some(s) => s,
    };

    if spec.is_empty() {
        return Err(PatternError::EmptySpec(raw.to_string()));
    }
    if spec == "*" {
        return Ok((tool.to_string(), Pattern::full()));
    }

    // Wildcards are suffix-only
    if let Some(star) = spec.find('*') {
        if star != spec.len() - 1 {
            return Err(PatternError::InteriorWildcard(raw.to_string()));
        }
        let prefix = &spec[..star];
        if let Some(stripped) = prefix.strip_suffix(' ') {
            if stripped.is_empty() {
                return Err(PatternError::EmptySpec(raw.to_string()));
            }
            return Ok((tool.to_string(), Pattern::boundary_prefix(stripped)));
        }
        return Ok((tool.to_string(), Pattern::bare_prefix(prefix)));
    }

    Ok((tool.to_string(), Pattern::exact(spec)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> (String, Pattern) {
        parse_rule(raw, &[]).unwrap()
    }

    #[test]
    fn test_parse_exact() {
        let (tool, pattern) = parse("Bash(git status)");
        assert_eq!(tool, "Bash");
        assert_eq!(pattern.kind, PatternKind::Exact);
        assert_eq!(pattern.literal(), "git status");
    }

    #[test]
    fn test_parse_boundary_prefix() {
        let (_, pattern) = parse("Bash(git diff *)");
        assert_eq!(pattern.kind, PatternKind::BoundaryPrefix);
        assert_eq!(pattern.literal(), "git diff");
    }

    #[test]
    fn test_parse_bare_prefix() {
        let (_, pattern) = parse("Bash(git diff*)");
        assert_eq!(pattern.kind, PatternKind::BarePrefix);
        assert_eq!(pattern.literal(), "git diff");
    }

    #[test]
    fn test_parse_full_both_spellings() {
        let (_, bare) = parse("Bash");
        let (_, star) = parse("Bash(*)");
        assert_eq!(bare.kind, PatternKind::Full);
        assert_eq!(bare, star);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_rule("Bash(git diff", &[]),
            Err(PatternError::UnbalancedDelimiters(_))
        ));
        assert!(matches!(
            parse_rule("Frobnicate(x)", &[]),
            Err(PatternError::UnknownTool(_))
        ));
        assert!(matches!(
            parse_rule("Bash()", &[]),
            Err(PatternError::EmptySpec(_))
        ));
        assert!(matches!(
            parse_rule("Bash(git * diff)", &[]),
            Err(PatternError::InteriorWildcard(_))
        ));
    }

    #[test]
    fn test_extra_tools() {
        assert!(parse_rule("MyTool(x)", &[]).is_err());
        assert!(parse_rule("MyTool(x)", &["MyTool".to_string()]).is_ok());
    }

    #[test]
    fn test_exact_matching() {
        let p = Pattern::exact("git status");
        assert!(p.matches("git status"));
        assert!(!p.matches("git status --short"));
        assert!(!p.matches("Git Status"));
    }

    #[test]
    fn test_boundary_prefix_matching() {
        let p = Pattern::boundary_prefix("ls");
        assert!(p.matches("ls -la"));
        assert!(!p.matches("ls"));
        assert!(!p.matches("lsof"));
    }

    #[test]
    fn test_bare_prefix_matching() {
        let p = Pattern::bare_prefix("ls");
        assert!(p.matches("ls -la"));
        assert!(p.matches("ls"));
        assert!(p.matches("lsof"));
    }

    #[test]
    fn test_full_matching() {
        let p = Pattern::full();
        assert!(p.matches("anything at all"));
        assert!(p.matches(""));
    }

    #[test]
    fn test_covers_full() {
        assert!(Pattern::full().covers(&Pattern::exact("x")));
        assert!(Pattern::full().covers(&Pattern::bare_prefix("git")));
        assert!(!Pattern::exact("x").covers(&Pattern::full()));
    }

    #[test]
    fn test_covers_boundary_prefix() {
        let wide = Pattern::boundary_prefix("git");
        assert!(wide.covers(&Pattern::exact("git diff --stat")));
        assert!(wide.covers(&Pattern::boundary_prefix("git diff")));
        assert!(wide.covers(&Pattern::bare_prefix("git diff")));
        // Boundary form does not match the bare base command
        assert!(!wide.covers(&Pattern::exact("git")));
        assert!(!wide.covers(&Pattern::bare_prefix("git")));
    }

    #[test]
    fn test_covers_bare_prefix() {
        let wide = Pattern::bare_prefix("git diff");
        assert!(wide.covers(&Pattern::exact("git diff")));
        assert!(wide.covers(&Pattern::exact("git difftool")));
        assert!(wide.covers(&Pattern::boundary_prefix("git diff")));
        assert!(wide.covers(&Pattern::bare_prefix("git diff --")));
        assert!(!wide.covers(&Pattern::exact("git push")));
    }

    #[test]
    fn test_overlaps() {
        let boundary = Pattern::boundary_prefix("git diff");
        let exact = Pattern::exact("git diff --stat");
        assert!(boundary.overlaps(&exact));
        assert!(exact.overlaps(&boundary));

        let other = Pattern::exact("git push");
        assert!(!boundary.overlaps(&other));

        let sudo = Pattern::boundary_prefix("sudo");
        let systemctl = Pattern::exact("sudo systemctl restart nginx");
        assert!(sudo.overlaps(&systemctl));

        assert!(Pattern::full().overlaps(&exact));
        assert!(Pattern::bare_prefix("ls").overlaps(&Pattern::exact("lsof")));
        assert!(!Pattern::boundary_prefix("ls").overlaps(&Pattern::exact("lsof")));
    }

    #[test]
    fn test_render_round_trip() {
        for raw in [
            "Bash(git status)",
            "Bash(git diff *)",
            "Bash(git diff*)",
            "Read(/tmp/scratch.txt)",
        ] {
            let (tool, pattern) = parse(raw);
            assert_eq!(format!("{}({})", tool, pattern.render_spec()), raw);
        }
    }
}
