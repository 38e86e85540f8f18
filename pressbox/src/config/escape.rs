//! Escaping for PHP single-quoted string literals

/// Escape `value` for embedding between single quotes in PHP source.
///
/// Backslashes go first; escaping quotes first would double the
/// backslashes inserted for them.
pub fn escape_php_single_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
