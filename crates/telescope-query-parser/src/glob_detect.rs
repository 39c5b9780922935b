//! Glob wildcard detection.
//!
//! All call sites use a single function: `has_wildcards(text) -> bool`.
//! The checked set of wildcard characters (`*`, `?`, `[`, `{`) is the one
//! ripgrep's glob engine treats as special.

#[inline]
pub fn has_wildcards(s: &str) -> bool {
    s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
}
