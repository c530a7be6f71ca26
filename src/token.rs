/// Reserved token standing for "any value" at a template position.
pub const WILDCARD: &str = "<*>";

/// Splits a preprocessed line on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Tokens carrying a digit (ids, counters, timestamps) never become literal tree keys.
pub fn is_numeric(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
}

pub fn is_wildcard(token: &str) -> bool {
    token == WILDCARD
}

/// Space-joined form used for reporting and event ids.
pub fn join(tokens: &[String]) -> String {
    itertools::join(tokens, " ")
}
