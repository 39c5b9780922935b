//! An `EditorSurface` that loads files into memory and prints what an
//! editor would show: the previewed line with the match marked.

use ahash::AHashMap;
use std::path::{Path, PathBuf};
use telescope_core::{EditorSurface, OpenMode, Span};

#[derive(Debug)]
struct View {
    path: PathBuf,
    transient: bool,
    text: Vec<char>,
    /// Char offset of every line start
    line_starts: Vec<usize>,
    cursor: usize,
}

impl View {
    fn load(path: &Path, mode: OpenMode) -> Self {
        let text: Vec<char> = match std::fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).chars().collect(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read previewed file");
                Vec::new()
            }
        };

        let line_starts = std::iter::once(0)
            .chain(
                text.iter()
                    .enumerate()
                    .filter(|(_, c)| **c == '\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();

        Self {
            path: path.to_path_buf(),
            transient: mode == OpenMode::Transient,
            text,
            line_starts,
            cursor: 0,
        }
    }

    /// 0-based line containing `point`
    fn row_of(&self, point: usize) -> usize {
        self.line_starts
            .partition_point(|start| *start <= point)
            .saturating_sub(1)
    }

    fn line_end(&self, row: usize) -> usize {
        self.line_starts
            .get(row + 1)
            .map_or(self.text.len(), |next| next - 1)
    }
}

#[derive(Debug, Default)]
pub struct TerminalSurface {
    views: AHashMap<u32, View>,
    next_id: u32,
    active: Option<u32>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// `line` with `[` `]` around `region`, both clamped to the line
    pub fn render_line(&self, handle: u32, region: Span) -> Option<String> {
        let view = self.views.get(&handle)?;
        let row = view.row_of(region.start);
        let start = view.line_starts.get(row).copied()?;
        let end = view.line_end(row);

        let mark_start = region.start.clamp(start, end);
        let mark_end = region.end.clamp(mark_start, end);

        let slice = |from: usize, to: usize| view.text[from..to].iter().collect::<String>();
        Some(format!(
            "{}[{}]{}",
            slice(start, mark_start),
            slice(mark_start, mark_end),
            slice(mark_end, end),
        ))
    }
}

impl EditorSurface for TerminalSurface {
    type Handle = u32;

    fn open_file(&mut self, path: &Path, mode: OpenMode) -> u32 {
        if let Some((id, view)) = self.views.iter_mut().find(|(_, v)| v.path == path) {
            if mode == OpenMode::Persistent && view.transient {
                view.transient = false;
                println!("opened {}", path.display());
            }
            self.active = Some(*id);
            return *id;
        }

        self.next_id += 1;
        self.active = Some(self.next_id);
        self.views.insert(self.next_id, View::load(path, mode));
        if mode == OpenMode::Persistent {
            println!("opened {}", path.display());
        }
        self.next_id
    }

    fn surface_path(&self, handle: u32) -> Option<PathBuf> {
        self.views.get(&handle).map(|v| v.path.clone())
    }

    /// Files are read synchronously on open
    fn is_loading(&self, _handle: u32) -> bool {
        false
    }

    fn is_transient(&self, handle: u32) -> bool {
        self.views.get(&handle).is_some_and(|v| v.transient)
    }

    fn text_point(&self, handle: u32, row: u64, column: usize) -> usize {
        let Some(view) = self.views.get(&handle) else {
            return 0;
        };
        let row = (row as usize).min(view.line_starts.len() - 1);
        let start = view.line_starts[row];
        (start + column).min(view.line_end(row))
    }

    fn scroll_to(&mut self, _handle: u32, _region: Span, _animate: bool) {}

    fn set_highlight(&mut self, handle: u32, _name: &str, regions: &[Span]) {
        let Some(region) = regions.first() else {
            return;
        };
        let Some(view) = self.views.get(&handle) else {
            return;
        };
        let row = view.row_of(region.start);
        let column = region.start - view.line_starts[row];
        if let Some(line) = self.render_line(handle, *region) {
            println!(
                "  preview {}:{}:{}  {}",
                view.path.display(),
                row + 1,
                column,
                line.trim()
            );
        }
    }

    fn set_cursor(&mut self, handle: u32, position: usize) {
        if let Some(view) = self.views.get_mut(&handle) {
            view.cursor = position.min(view.text.len());
        }
    }

    fn cursor(&self, handle: u32) -> Option<usize> {
        self.views.get(&handle).map(|v| v.cursor)
    }

    fn surfaces(&self) -> Vec<u32> {
        self.views.keys().copied().collect()
    }

    fn active_surface(&self) -> Option<u32> {
        self.active
    }

    fn focus(&mut self, handle: u32) {
        if self.views.contains_key(&handle) {
            self.active = Some(handle);
        }
    }

    fn close_surface(&mut self, handle: u32) {
        self.views.remove(&handle);
        self.active.take_if(|active| *active == handle);
    }
}
