use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigError;
use crate::token::WILDCARD;

// Order matters: timestamps and addresses before the generic number rules, so that
// a timestamp is masked whole instead of digit run by digit run.
const DEFAULT_RULES: &[&str] = &[
    // ISO8601/RFC3339 with optional fraction and zone
    r"\b\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d{1,9})?(?:Z|[+-]\d{2}(?::?\d{2})?)?\b",
    r#"\b[a-zA-Z][a-zA-Z0-9+.-]*://[^\s"']+"#,
    r"\b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b",
    r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(?::\d{1,5})?\b",
    r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
    r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
    r"\b(?:0x)?[0-9a-fA-F]{16,}\b",
    r"\b-?\d+(?:\.\d+)?\b",
];

static COMPILED_DEFAULTS: Lazy<Vec<Regex>> =
    Lazy::new(|| DEFAULT_RULES.iter().map(|p| Regex::new(p).unwrap()).collect());

/// Built-in masking patterns for common variable fields, usable as preprocess rules.
pub fn default_rules() -> Vec<String> {
    DEFAULT_RULES.iter().map(|p| p.to_string()).collect()
}

/// Masks a line with the built-in rules without building a `Preprocessor`.
pub fn mask_defaults(line: &str) -> String {
    apply_all(&COMPILED_DEFAULTS, line)
}

/// Compiled preprocess rules, each match replaced by the wildcard marker.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    rules: Vec<Regex>,
}

impl Preprocessor {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let rules = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|source| ConfigError::InvalidRule { pattern: p.to_string(), source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn apply(&self, line: &str) -> String {
        apply_all(&self.rules, line)
    }
}

fn apply_all(rules: &[Regex], line: &str) -> String {
    let mut out = line.to_string();
    for re in rules {
        out = re.replace_all(&out, WILDCARD).into_owned();
    }
    out
}
