//! Translation of editor-style globs into ripgrep filter flags.
//!
//! Editor glob settings match anywhere below a project folder and let `*`
//! cross path separators. ripgrep's glob engine does neither by default, so
//! every pattern is anchored under `**/` and runs of `*` collapse to `**`.

use crate::constraints::Constraint;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static STAR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*+").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobFlagKind {
    /// `--iglob`, case-insensitive glob. Excludes carry a leading `!`.
    IGlob,
    /// `--type`
    Type,
    /// `--type-not`
    TypeNot,
}

impl GlobFlagKind {
    pub fn flag(self) -> &'static str {
        match self {
            GlobFlagKind::IGlob => "--iglob",
            GlobFlagKind::Type => "--type",
            GlobFlagKind::TypeNot => "--type-not",
        }
    }
}

/// One `(flagName, patternValue)` pair for the grep tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobFlag {
    pub kind: GlobFlagKind,
    pub value: String,
}

impl GlobFlag {
    pub fn to_args(&self) -> [String; 2] {
        [self.kind.flag().to_string(), self.value.clone()]
    }
}

/// Collapse every run of `*` into `**`.
pub fn normalize_stars(pattern: &str) -> Cow<'_, str> {
    STAR_RUN.replace_all(pattern, "**")
}

/// Anchor a pattern below any directory (`**/*<pattern>`) unless it is
/// already anchored, then normalize its stars.
pub fn anchor(pattern: &str) -> String {
    if pattern.starts_with("**/") || pattern.starts_with('/') {
        normalize_stars(pattern).into_owned()
    } else {
        normalize_stars(&format!("**/*{pattern}")).into_owned()
    }
}

/// One entry of the comma separated filter input (`.py, -*.min.js, views/*.html`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEntry<'a> {
    Include(&'a str),
    Exclude(&'a str),
}

/// Split the session filter input on commas. Empty entries are skipped,
/// a leading `-` negates the entry.
pub fn parse_filter_list(input: &str) -> impl Iterator<Item = FilterEntry<'_>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.strip_prefix('-') {
            Some(rest) if rest.trim().is_empty() => None,
            Some(rest) => Some(FilterEntry::Exclude(rest.trim())),
            None => Some(FilterEntry::Include(entry)),
        })
}

/// Accumulates filter flags in the order they are added. Malformed
/// patterns are passed through as-is.
#[derive(Debug, Clone, Default)]
pub struct GlobTranslator {
    flags: Vec<GlobFlag>,
}

impl GlobTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: GlobFlagKind, value: String) {
        self.flags.push(GlobFlag { kind, value });
    }

    pub fn include(&mut self, pattern: &str) -> &mut Self {
        self.push(GlobFlagKind::IGlob, anchor(pattern));
        self
    }

    pub fn exclude(&mut self, pattern: &str) -> &mut Self {
        self.push(GlobFlagKind::IGlob, format!("!{}", anchor(pattern)));
        self
    }

    /// Editor `binary_file_patterns` / `file_exclude_patterns` entries
    pub fn exclude_files<S: AsRef<str>>(&mut self, patterns: &[S]) -> &mut Self {
        for pattern in patterns {
            self.exclude(pattern.as_ref());
        }
        self
    }

    /// Editor `folder_exclude_patterns` entries exclude the whole subtree
    pub fn exclude_folders<S: AsRef<str>>(&mut self, patterns: &[S]) -> &mut Self {
        for pattern in patterns {
            self.exclude(&format!("**/{}**/", pattern.as_ref()));
        }
        self
    }

    pub fn file_type(&mut self, name: &str) -> &mut Self {
        self.push(GlobFlagKind::Type, name.to_string());
        self
    }

    pub fn not_file_type(&mut self, name: &str) -> &mut Self {
        self.push(GlobFlagKind::TypeNot, name.to_string());
        self
    }

    pub fn filter_input(&mut self, input: &str) -> &mut Self {
        for entry in parse_filter_list(input) {
            match entry {
                FilterEntry::Include(pattern) => self.include(pattern),
                FilterEntry::Exclude(pattern) => self.exclude(pattern),
            };
        }
        self
    }

    pub fn constraints(&mut self, constraints: &[Constraint<'_>]) -> &mut Self {
        for constraint in constraints {
            match constraint {
                Constraint::Include(glob) => {
                    self.include(glob);
                }
                Constraint::Exclude(glob) => {
                    self.exclude(glob);
                }
                Constraint::FileType(name) => {
                    self.file_type(name);
                }
                Constraint::NotFileType(name) => {
                    self.not_file_type(name);
                }
                Constraint::HomeRoot => {}
            }
        }
        self
    }

    pub fn finish(self) -> Vec<GlobFlag> {
        self.flags
    }
}
