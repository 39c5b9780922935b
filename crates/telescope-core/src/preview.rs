use crate::surface::{EditorSurface, OpenMode};
use crate::types::{ResultSet, SearchResult, Span};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    /// Cursor, scroll and highlight are set
    Applied,
    /// The surface is loading; applied on its load-complete event
    Deferred,
    /// Nothing to preview
    Skipped,
}

#[derive(Debug)]
struct BoundSurface<H> {
    handle: H,
    path: PathBuf,
}

/// A preview waiting for its surface to finish loading. Holds its own
/// snapshot of the result set, unaffected by later searches.
#[derive(Debug)]
struct PendingPreview<H> {
    handle: H,
    results: ResultSet,
    index: usize,
}

/// Keeps the session's preview surface in sync with the highlighted result
#[derive(Debug)]
pub struct PreviewCoordinator<H> {
    bound: Option<BoundSurface<H>>,
    pending: Option<PendingPreview<H>>,
    highlight_name: String,
}

impl<H: Copy + Eq + std::fmt::Debug> PreviewCoordinator<H> {
    pub fn new(highlight_name: impl Into<String>) -> Self {
        Self {
            bound: None,
            pending: None,
            highlight_name: highlight_name.into(),
        }
    }

    pub fn bound_handle(&self) -> Option<H> {
        self.bound.as_ref().map(|b| b.handle)
    }

    pub fn bound_path(&self) -> Option<&Path> {
        self.bound.as_ref().map(|b| b.path.as_path())
    }

    pub fn is_deferred(&self) -> bool {
        self.pending.is_some()
    }

    /// True when `handle` is this session's preview surface
    pub fn owns(&self, handle: H) -> bool {
        self.bound_handle() == Some(handle)
            || self.pending.as_ref().map(|p| p.handle) == Some(handle)
    }

    /// Preview `results[index]`, reusing the bound surface when it already
    /// shows the result's file.
    pub fn show<S>(&mut self, surface: &mut S, results: &ResultSet, index: usize) -> PreviewState
    where
        S: EditorSurface<Handle = H>,
    {
        let Some(result) = results.get(index) else {
            return PreviewState::Skipped;
        };

        let handle = self.surface_for(surface, &result.path);

        if surface.is_loading(handle) {
            debug!(?handle, index, "Preview surface loading, deferring");
            self.pending = Some(PendingPreview {
                handle,
                results: results.clone(),
                index,
            });
            return PreviewState::Deferred;
        }

        self.pending = None;
        self.apply(surface, handle, result);
        PreviewState::Applied
    }

    /// Resume a deferred preview once `handle` finished loading
    pub fn surface_loaded<S>(&mut self, surface: &mut S, handle: H) -> PreviewState
    where
        S: EditorSurface<Handle = H>,
    {
        let Some(pending) = self.pending.take_if(|p| p.handle == handle) else {
            trace!(?handle, "Load event for a surface without pending preview");
            return PreviewState::Skipped;
        };

        match pending.results.get(pending.index) {
            Some(result) => {
                self.apply(surface, handle, result);
                PreviewState::Applied
            }
            None => PreviewState::Skipped,
        }
    }

    /// Erase the highlight, optionally closing a still transient surface,
    /// and unbind.
    pub fn release<S>(&mut self, surface: &mut S, close_transient: bool)
    where
        S: EditorSurface<Handle = H>,
    {
        self.pending = None;
        let Some(bound) = self.bound.take() else {
            return;
        };

        surface.set_highlight(bound.handle, &self.highlight_name, &[]);
        if close_transient && surface.is_transient(bound.handle) {
            debug!(path = %bound.path.display(), "Closing preview surface");
            surface.close_surface(bound.handle);
        }
    }

    /// Forget `handle` without touching the surface. Used when another
    /// session took the surface over.
    pub fn detach(&mut self, handle: H) -> bool {
        let pending = self.pending.take_if(|p| p.handle == handle).is_some();
        let bound = self.bound.take_if(|b| b.handle == handle).is_some();
        pending || bound
    }

    /// Make `result`'s file a regular view and put the cursor on the match.
    /// A view that is still loading keeps the host's default position.
    pub fn confirm<S>(&mut self, surface: &mut S, result: &SearchResult) -> H
    where
        S: EditorSurface<Handle = H>,
    {
        self.release(surface, false);
        let handle = surface.open_file(&result.path, OpenMode::Persistent);
        if !surface.is_loading(handle) {
            let region = self.region(surface, handle, result);
            surface.set_cursor(handle, region.start);
            surface.scroll_to(handle, region, false);
        }
        handle
    }

    fn surface_for<S>(&mut self, surface: &mut S, path: &Path) -> H
    where
        S: EditorSurface<Handle = H>,
    {
        if let Some(bound) = &self.bound
            && bound.path == path
            && surface.surface_path(bound.handle).as_deref() == Some(path)
        {
            return bound.handle;
        }

        if let Some(previous) = self.bound.take() {
            surface.set_highlight(previous.handle, &self.highlight_name, &[]);
            if surface.is_transient(previous.handle) {
                trace!(path = %previous.path.display(), "Closing previous preview");
                surface.close_surface(previous.handle);
            }
        }

        let handle = surface.open_file(path, OpenMode::Transient);
        self.bound = Some(BoundSurface {
            handle,
            path: path.to_path_buf(),
        });
        handle
    }

    fn region<S>(&self, surface: &S, handle: H, result: &SearchResult) -> Span
    where
        S: EditorSurface<Handle = H>,
    {
        let start = surface.text_point(
            handle,
            result.line_number.saturating_sub(1),
            result.match_span.start,
        );
        Span::new(start, start + result.match_span.len())
    }

    fn apply<S>(&self, surface: &mut S, handle: H, result: &SearchResult)
    where
        S: EditorSurface<Handle = H>,
    {
        let region = self.region(surface, handle, result);
        surface.scroll_to(handle, region, false);
        surface.set_cursor(handle, region.start);
        surface.set_highlight(handle, &self.highlight_name, &[region]);
        trace!(?handle, ?region, "Preview applied");
    }
}
