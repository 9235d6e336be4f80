//! Safe-transform normalization of rule strings
//!
//! Only transforms that provably preserve matching semantics are applied:
//! trailing-whitespace trim, repeated-whitespace collapse when no quote
//! makes whitespace significant, and the legacy `...` suffix wildcard
//! rewritten to its current spelling. Quoting style is never changed and
//! distinct command strings are never merged.

use once_cell::sync::Lazy;
use regex::Regex;

/// Result of normalizing one raw rule string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// The normalized rule string
    pub text: String,

    /// Names of the transforms that fired, in application order
    pub transforms: Vec<&'static str>,
}

impl Normalized {
    pub fn changed(&self) -> bool {
        !self.transforms.is_empty()
    }
}

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Apply the safe transforms to a raw rule string. Idempotent:
/// `normalize(normalize(r).text) == normalize(r).text`.
pub fn normalize(raw: &str) -> Normalized {
    let mut transforms = Vec::new();
    let mut text = raw.to_string();

    let trimmed = text.trim_end();
    if trimmed.len() != text.len() {
        text.truncate(trimmed.len());
        transforms.push("trim-trailing-whitespace");
    }

    // A quote is a structural marker: whitespace inside it may be
    // significant, so only unquoted strings are collapsed
    if !text.contains('\'') && !text.contains('"') && WHITESPACE_RUN.is_match(&text) {
        text = WHITESPACE_RUN.replace_all(&text, " ").into_owned();
        transforms.push("collapse-whitespace");
    }

    // Legacy suffix wildcard: `Tool(spec...)` meant what `Tool(spec*)`
    // means today, so the rewrite is exact
    if let Some(stripped) = text.strip_suffix("...)") {
        text = format!("{}*)", stripped);
        transforms.push("rewrite-deprecated-wildcard");
    }

    Normalized { text, transforms }
}
