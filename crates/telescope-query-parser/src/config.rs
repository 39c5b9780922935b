use crate::constraints::Constraint;

/// Parser configuration trait - lets each search surface decide which
/// query tokens are special and which are plain search text.
pub trait ParserConfig {
    /// Should parse `*.ext` style include globs
    fn enable_glob(&self) -> bool {
        true
    }

    /// Should parse `-*.ext` style exclude globs and `-type:` negations
    fn enable_exclude(&self) -> bool {
        true
    }

    /// Should parse type constraints (e.g., type:rust)
    fn enable_type_filter(&self) -> bool {
        true
    }

    /// Should treat a standalone `~` as "search the home directory"
    fn enable_home_root(&self) -> bool {
        true
    }

    /// Custom constraint parsers for surface-specific needs
    fn parse_custom<'a>(&self, _input: &'a str) -> Option<Constraint<'a>> {
        None
    }
}

/// Default configuration for the live grep surface - all features enabled
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveGrepConfig;

impl ParserConfig for LiveGrepConfig {
    // All defaults enabled
}

/// Configuration for sessions whose file filter comes from a separate input
/// (the single-extension / globs-prompt variant). Only `~` stays special,
/// glob-looking tokens are searched literally.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedFilterConfig;

impl ParserConfig for FixedFilterConfig {
    fn enable_glob(&self) -> bool {
        false
    }

    fn enable_exclude(&self) -> bool {
        false
    }

    fn enable_type_filter(&self) -> bool {
        false
    }
}
