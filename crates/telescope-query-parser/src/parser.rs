use crate::ConstraintVec;
use crate::config::ParserConfig;
use crate::constraints::{Constraint, TextPartsBuffer};
use crate::glob_detect::has_wildcards;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult<'a> {
    /// Parsed constraints (stack-allocated for ≤8 constraints)
    pub constraints: ConstraintVec<'a>,
    /// Literal search tokens in query order
    pub text_parts: TextPartsBuffer<'a>,
}

impl ParseResult<'_> {
    /// The literal search text: every non-constraint token joined with a
    /// single space, `"name = *.rs someth"` -> `"name = someth"`.
    pub fn search_text(&self) -> String {
        self.text_parts.join(" ")
    }

    pub fn has_file_filters(&self) -> bool {
        self.constraints.iter().any(Constraint::is_file_filter)
    }

    pub fn uses_home_root(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| matches!(c, Constraint::HomeRoot))
    }

    /// No literal text but at least one file filter: list matching files
    /// instead of searching their contents.
    pub fn is_files_only(&self) -> bool {
        self.text_parts.is_empty() && self.has_file_filters()
    }
}

/// Main query parser - zero-cost wrapper around configuration
#[derive(Debug)]
pub struct QueryParser<C: ParserConfig> {
    config: C,
}

impl<C: ParserConfig> QueryParser<C> {
    pub fn new(config: C) -> Self {
        Self { config }
    }

    pub fn parse<'a>(&self, query: &'a str) -> ParseResult<'a> {
        let config: &C = &self.config;
        let mut constraints = ConstraintVec::new();
        let mut text_parts = TextPartsBuffer::new();

        for token in query.split_whitespace() {
            // `\*.rs`, `\-foo`, `\~` search the token literally. Any other
            // backslash sequence is left alone.
            if let Some(suffix) = token.strip_prefix('\\')
                && !suffix.is_empty()
            {
                if parse_token(suffix, config).is_some() {
                    text_parts.push(suffix);
                } else {
                    text_parts.push(token);
                }
                continue;
            }

            match parse_token(token, config) {
                Some(constraint) => constraints.push(constraint),
                None => text_parts.push(token),
            }
        }

        ParseResult {
            constraints,
            text_parts,
        }
    }
}

impl Default for QueryParser<crate::LiveGrepConfig> {
    fn default() -> Self {
        Self::new(crate::LiveGrepConfig)
    }
}

#[inline]
fn parse_token<'a, C: ParserConfig>(token: &'a str, config: &C) -> Option<Constraint<'a>> {
    let first_byte = token.as_bytes().first()?;

    match first_byte {
        b'~' if token.len() == 1 && config.enable_home_root() => Some(Constraint::HomeRoot),
        b'*' if config.enable_glob() => parse_include(token),
        b'-' if config.enable_exclude() => parse_exclusion(token, config),
        _ => {
            if config.enable_type_filter()
                && let Some(value) = parse_type(token)
            {
                return Some(Constraint::FileType(value));
            }

            config.parse_custom(token)
        }
    }
}

/// Parse include glob: *.py -> Include("*.py"). A lone `*` is plain text.
#[inline]
fn parse_include(token: &str) -> Option<Constraint<'_>> {
    if token.len() > 1 && has_wildcards(token) {
        Some(Constraint::Include(token))
    } else {
        None
    }
}

/// Parse exclusion: -*.py -> Exclude("*.py"), -type:js -> NotFileType("js").
/// Anything else starting with `-` (`-1`, `--flag`) stays search text.
#[inline]
fn parse_exclusion<'a, C: ParserConfig>(token: &'a str, config: &C) -> Option<Constraint<'a>> {
    let inner = &token[1..];

    if config.enable_glob()
        && inner.starts_with('*')
        && let Some(Constraint::Include(glob)) = parse_include(inner)
    {
        return Some(Constraint::Exclude(glob));
    }

    if config.enable_type_filter() {
        return parse_type(inner).map(Constraint::NotFileType);
    }

    None
}

#[inline]
fn parse_type(token: &str) -> Option<&str> {
    token.strip_prefix("type:").filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixedFilterConfig, LiveGrepConfig};

    #[test]
    fn test_parse_include() {
        assert_eq!(parse_include("*.rs"), Some(Constraint::Include("*.rs")));
        assert_eq!(
            parse_include("*test*.py"),
            Some(Constraint::Include("*test*.py"))
        );
        assert_eq!(parse_include("*"), None);
    }

    #[test]
    fn test_parse_exclusion() {
        let config = LiveGrepConfig;
        assert_eq!(
            parse_exclusion("-*.min.js", &config),
            Some(Constraint::Exclude("*.min.js"))
        );
        assert_eq!(
            parse_exclusion("-type:js", &config),
            Some(Constraint::NotFileType("js"))
        );
        assert_eq!(parse_exclusion("-1", &config), None);
        assert_eq!(parse_exclusion("--flag", &config), None);
        assert_eq!(parse_exclusion("-", &config), None);
    }

    #[test]
    fn test_parse_type() {
        assert_eq!(parse_type("type:rust"), Some("rust"));
        assert_eq!(parse_type("type:"), None);
        assert_eq!(parse_type("typo:rust"), None);
    }

    #[test]
    fn test_home_root_only_standalone() {
        let parser = QueryParser::new(LiveGrepConfig);
        let result = parser.parse("~ dotfile");
        assert!(result.uses_home_root());
        assert_eq!(result.search_text(), "dotfile");

        let result = parser.parse("~/.config");
        assert!(!result.uses_home_root());
        assert_eq!(result.search_text(), "~/.config");
    }

    #[test]
    fn test_escaped_constraints_are_literal() {
        let parser = QueryParser::new(LiveGrepConfig);
        let result = parser.parse(r"\*.rs \-*.py \~");
        assert!(result.constraints.is_empty());
        assert_eq!(result.search_text(), "*.rs -*.py ~");

        // Non-constraint escapes keep their backslash
        let result = parser.parse(r"\bword");
        assert_eq!(result.search_text(), r"\bword");
    }

    #[test]
    fn test_fixed_filter_config_keeps_globs_literal() {
        let parser = QueryParser::new(FixedFilterConfig);
        let result = parser.parse("*.rs -*.py type:rust ~");
        assert_eq!(result.constraints.len(), 1);
        assert!(result.uses_home_root());
        assert_eq!(result.search_text(), "*.rs -*.py type:rust");
    }

    #[test]
    fn test_files_only_detection() {
        let parser = QueryParser::new(LiveGrepConfig);
        assert!(parser.parse("*.py").is_files_only());
        assert!(parser.parse("*.py -*_test.py").is_files_only());
        assert!(!parser.parse("~").is_files_only());
        assert!(!parser.parse("foo *.py").is_files_only());
    }
}
