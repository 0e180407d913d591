use std::sync::OnceLock;

use regex::Regex;

/// Variables are exposed to scripts as `vars.<name>`.
pub(crate) fn is_variable_name(name: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("variable regex"))
        .is_match(name)
}

/// A node or group name is one path segment: no separator, no whitespace.
pub(crate) fn is_node_name(name: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[^.\s]+$").expect("node name regex"))
        .is_match(name)
}
