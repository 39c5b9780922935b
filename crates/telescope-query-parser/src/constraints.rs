use smallvec::SmallVec;

/// Constraint types that can be extracted from a live search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint<'a> {
    /// Include glob: *.py -> Include("*.py")
    Include(&'a str),

    /// Exclude glob: -*.py -> Exclude("*.py")
    Exclude(&'a str),

    /// File type constraint: type:rust -> FileType("rust")
    FileType(&'a str),

    /// Negated file type: -type:rust -> NotFileType("rust")
    NotFileType(&'a str),

    /// Standalone `~`: search the home directory instead of the project roots
    HomeRoot,
}

impl Constraint<'_> {
    /// True for constraints that narrow the searched file set.
    /// Files-only mode kicks in when such a constraint exists without search text.
    #[inline]
    pub fn is_file_filter(&self) -> bool {
        !matches!(self, Constraint::HomeRoot)
    }
}

/// Stack-allocated buffer for text parts (up to 16 parts without heap allocation)
pub type TextPartsBuffer<'a> = SmallVec<[&'a str; 16]>;
