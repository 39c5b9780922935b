//! Incremental parser for grep tool output.
//!
//! Lines are pushed one at a time as they are read from the process pipe, so
//! a search that hits its deadline still yields the results read so far.
//! Nothing here errors: malformed lines and records are skipped.

use crate::config::OutputFormat;
use crate::planner::{SearchMode, SearchPlan};
use crate::types::{DisplayText, ResultSet, SearchResult, Span, truncate_chars};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::trace;

#[derive(Debug, Deserialize)]
struct RgRecord {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// ripgrep emits `{"text": ..}` for UTF-8 data and `{"bytes": ..}` otherwise
#[derive(Debug, Deserialize)]
struct RgData {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RgBegin {
    path: RgData,
}

#[derive(Debug, Deserialize)]
struct RgMatch {
    path: RgData,
    lines: RgData,
    line_number: Option<u64>,
    #[serde(default)]
    submatches: Vec<RgSubmatch>,
}

#[derive(Debug, Deserialize)]
struct RgSubmatch {
    start: usize,
    end: usize,
}

#[derive(Debug)]
pub struct ResultParser {
    format: OutputFormat,
    mode: SearchMode,
    max_results: usize,
    max_display_chars: usize,
    results: Vec<SearchResult>,
    display_buffer: String,
    current_file: Option<PathBuf>,
}

impl ResultParser {
    pub fn new(
        format: OutputFormat,
        mode: SearchMode,
        max_results: usize,
        max_display_chars: usize,
    ) -> Self {
        Self {
            format,
            mode,
            max_results,
            max_display_chars,
            results: Vec::with_capacity(max_results.min(256)),
            display_buffer: String::new(),
            current_file: None,
        }
    }

    pub fn for_plan(plan: &SearchPlan) -> Self {
        Self::new(
            plan.format,
            plan.mode,
            plan.limits.max_results,
            plan.limits.max_display_chars,
        )
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.results.len() >= self.max_results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Feed one line of output, without its terminator. Returns false once
    /// the result cap is reached and no further input is wanted.
    pub fn push_line(&mut self, line: &str) -> bool {
        if self.is_full() {
            return false;
        }

        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            return true;
        }

        match (self.mode, self.format) {
            (SearchMode::FilesOnly, _) => {
                self.results.push(SearchResult::whole_file(line));
            }
            (SearchMode::Content, OutputFormat::Lines) => {
                match parse_line(line, self.max_display_chars) {
                    Some(result) => self.results.push(result),
                    None => trace!(line, "Skipping malformed grep line"),
                }
            }
            (SearchMode::Content, OutputFormat::Json) => self.push_record(line),
        }

        !self.is_full()
    }

    pub fn finish(self) -> ResultSet {
        let capped = self.is_full();
        let buffer = match self.format {
            OutputFormat::Json if self.mode == SearchMode::Content => Some(self.display_buffer),
            _ => None,
        };
        ResultSet::new(self.results, buffer, capped)
    }

    fn push_record(&mut self, line: &str) {
        let record: RgRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                trace!(error = %e, "Skipping malformed json record");
                return;
            }
        };

        match record.kind.as_str() {
            "begin" => match serde_json::from_value::<RgBegin>(record.data) {
                Ok(RgBegin {
                    path: RgData { text: Some(path) },
                }) => self.start_file(Path::new(&path)),
                _ => trace!("Skipping begin record without a text path"),
            },
            "match" => match serde_json::from_value::<RgMatch>(record.data) {
                Ok(m) => self.push_match(m),
                Err(e) => trace!(error = %e, "Skipping malformed match record"),
            },
            // end, context, summary
            _ => {}
        }
    }

    fn start_file(&mut self, path: &Path) {
        self.display_buffer.push_str(&path.to_string_lossy());
        self.display_buffer.push_str(":\n");
        self.current_file = Some(path.to_path_buf());
    }

    fn push_match(&mut self, record: RgMatch) {
        let (Some(path), Some(text), Some(line_number)) =
            (record.path.text, record.lines.text, record.line_number)
        else {
            trace!("Skipping match record with non-UTF-8 data");
            return;
        };

        let path = PathBuf::from(path);
        if self.current_file.as_deref() != Some(path.as_path()) {
            self.start_file(&path);
        }

        let text = text.trim_end_matches(['\n', '\r']);
        let trimmed = text.trim_start();
        let trim_bytes = text.len() - trimmed.len();
        let shown = truncate_chars(trimmed, self.max_display_chars);

        self.display_buffer.push_str(&format!("  {line_number}: "));
        let content_start = self.display_buffer.len();
        self.display_buffer.push_str(shown);
        self.display_buffer.push('\n');
        let content_end = content_start + shown.len();

        let buffer_offset =
            |byte: usize| (content_start + byte.saturating_sub(trim_bytes)).min(content_end);

        if record.submatches.is_empty() {
            let column = char_column(text, trim_bytes);
            self.results.push(SearchResult {
                path,
                line_number,
                match_span: Span::new(column, column),
                display: DisplayText::Buffer(Span::new(content_start, content_start)),
            });
            return;
        }

        for submatch in &record.submatches {
            if self.is_full() {
                break;
            }
            self.results.push(SearchResult {
                path: path.clone(),
                line_number,
                match_span: Span::new(
                    char_column(text, submatch.start),
                    char_column(text, submatch.end),
                ),
                display: DisplayText::Buffer(Span::new(
                    buffer_offset(submatch.start),
                    buffer_offset(submatch.end),
                )),
            });
        }
    }
}

/// Number of characters before byte offset `byte`. Offsets past the end or
/// inside a code point round up to the next boundary.
fn char_column(text: &str, byte: usize) -> usize {
    text.char_indices().take_while(|(idx, _)| *idx < byte).count()
}

/// Length of a `C:\` / `C:/` drive prefix, absorbed into the path
fn drive_prefix_len(line: &str) -> usize {
    match line.as_bytes() {
        [letter, b':', b'\\' | b'/', ..] if letter.is_ascii_alphabetic() => 2,
        _ => 0,
    }
}

/// Parse a `path:line:content` line. The match span covers the trimmed
/// content in character columns of the untrimmed line.
pub fn parse_line(line: &str, max_display_chars: usize) -> Option<SearchResult> {
    let drive = drive_prefix_len(line);
    let (prefix, rest) = line.split_at(drive);

    let mut parts = rest.splitn(3, ':');
    let path = parts.next()?;
    let line_number = parts.next()?.trim().parse::<u64>().ok()?;
    let content = parts.next()?;

    if path.is_empty() {
        return None;
    }

    let trimmed = content.trim_start();
    let trim_chars = content[..content.len() - trimmed.len()].chars().count();
    let trimmed = trimmed.trim_end();

    Some(SearchResult {
        path: PathBuf::from(format!("{prefix}{path}")),
        line_number,
        match_span: Span::new(trim_chars, trim_chars + trimmed.chars().count()),
        display: DisplayText::Inline(truncate_chars(trimmed, max_display_chars).to_string()),
    })
}
