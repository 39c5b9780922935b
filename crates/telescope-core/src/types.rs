use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Half-open `[start, end)` interval. Construction clamps `end` to be
/// at least `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// How a result is rendered in the result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayText {
    /// Trimmed line text, truncated for display (inline quick-panel rows)
    Inline(String),
    /// Byte span of the match inside the result set's display buffer
    /// (output-panel rendering)
    Buffer(Span),
}

/// One matched line, or one matched file in files-only mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub path: PathBuf,
    /// 1-based line number. `0` marks a whole-file match.
    pub line_number: u64,
    /// Character columns of the match within the untrimmed line.
    pub match_span: Span,
    pub display: DisplayText,
}

impl SearchResult {
    /// A files-only result: no line, empty span, the path as display text.
    pub fn whole_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display = DisplayText::Inline(path.to_string_lossy().into_owned());
        Self {
            path,
            line_number: 0,
            match_span: Span::default(),
            display,
        }
    }

    #[inline]
    pub fn is_whole_file(&self) -> bool {
        self.line_number == 0
    }

    /// `path:line:col` as shown in result details
    pub fn location(&self) -> String {
        format!(
            "{}:{}:{}",
            self.path.display(),
            self.line_number,
            self.match_span.start
        )
    }
}

/// One row of the inline result list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub text: String,
    pub details: String,
}

/// Ordered, bounded, immutable set of results. Cloning is cheap and clones
/// stay valid snapshots after the owning session replaces its set.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    results: Arc<[SearchResult]>,
    display_buffer: Option<Arc<str>>,
    capped: bool,
}

impl ResultSet {
    pub fn new(results: Vec<SearchResult>, display_buffer: Option<String>, capped: bool) -> Self {
        Self {
            results: results.into(),
            display_buffer: display_buffer.map(Into::into),
            capped,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&SearchResult> {
        self.results.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchResult> {
        self.results.iter()
    }

    pub fn as_slice(&self) -> &[SearchResult] {
        &self.results
    }

    /// True when parsing stopped at the result cap
    pub fn is_capped(&self) -> bool {
        self.capped
    }

    pub fn display_buffer(&self) -> Option<&str> {
        self.display_buffer.as_deref()
    }

    /// True when both sets share the same backing storage
    pub fn ptr_eq(&self, other: &ResultSet) -> bool {
        Arc::ptr_eq(&self.results, &other.results)
    }

    /// The line of text a result is displayed with: the inline content,
    /// or the display buffer line that contains its span.
    pub fn display_line<'a>(&'a self, result: &'a SearchResult) -> Option<&'a str> {
        match &result.display {
            DisplayText::Inline(text) => Some(text),
            DisplayText::Buffer(span) => {
                let buffer = self.display_buffer()?;
                let start = span.start.min(buffer.len());
                let line_start = buffer[..start].rfind('\n').map_or(0, |i| i + 1);
                let line_end = buffer[start..]
                    .find('\n')
                    .map_or(buffer.len(), |i| start + i);
                Some(&buffer[line_start..line_end])
            }
        }
    }

    /// Fixed width rows for an inline result list
    pub fn rows(&self, width: usize) -> Vec<DisplayRow> {
        self.iter()
            .map(|result| DisplayRow {
                text: fixed_size(self.display_line(result).unwrap_or("").trim(), width),
                details: fixed_size(&result.location(), width),
            })
            .collect()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.iter().map(|r| r.path.as_path())
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a SearchResult;
    type IntoIter = std::slice::Iter<'a, SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Truncate to `width` characters and right-pad with spaces
pub fn fixed_size(s: &str, width: usize) -> String {
    let mut out: String = s.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat_n(' ', width - len));
    out
}

/// Truncate to at most `max_chars` characters, on a char boundary
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
