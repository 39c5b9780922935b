//! Allocation-light query parser for live code search
//!
//! Splits a raw search query into literal search text and the file filter
//! constraints hidden in it, then translates constraints and editor glob
//! settings into ripgrep flags:
//! - Zero heap allocations for queries with ≤8 constraints (SmallVec)
//! - Single pass over whitespace separated tokens
//! - Malformed tokens degrade to search text, never to an error
//!
//! # Examples
//!
//! ```
//! use telescope_query_parser::{Constraint, QueryParser};
//!
//! let parser = QueryParser::default();
//!
//! // Include glob next to search text
//! let result = parser.parse("fn main *.rs");
//! assert_eq!(result.search_text(), "fn main");
//! assert!(matches!(result.constraints[0], Constraint::Include("*.rs")));
//!
//! // Negated glob
//! let result = parser.parse("-*.min.js render");
//! assert!(matches!(result.constraints[0], Constraint::Exclude("*.min.js")));
//!
//! // Only globs: list matching files instead of searching contents
//! assert!(parser.parse("*.toml").is_files_only());
//! ```

mod config;
mod constraints;
pub mod glob;
mod glob_detect;
mod parser;

pub use config::{FixedFilterConfig, LiveGrepConfig, ParserConfig};
pub use constraints::{Constraint, TextPartsBuffer};
pub use glob::{FilterEntry, GlobFlag, GlobFlagKind, GlobTranslator, parse_filter_list};
pub use glob_detect::has_wildcards;
pub use parser::{ParseResult, QueryParser};

// Re-export SmallVec for convenience
pub use smallvec::SmallVec;

/// Type alias for constraint vector - stack-allocated for ≤8 constraints
pub type ConstraintVec<'a> = SmallVec<[Constraint<'a>; 8]>;
