//! The editor capabilities the engine consumes.
//!
//! The host hands one `EditorSurface` to the engine when it is created; the
//! engine never looks up its collaborators on its own. Load completion is
//! not a callback here: the host reports it with
//! [`EngineEvent::SurfaceLoaded`](crate::engine::EngineEvent::SurfaceLoaded).

use crate::types::Span;
use std::fmt::Debug;
use std::hash::Hash;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Preview: stays out of navigation history until confirmed
    Transient,
    Persistent,
}

pub trait EditorSurface {
    /// Identifies one open view. Handles travel through the engine queue.
    type Handle: Copy + Eq + Hash + Debug + Send + 'static;

    /// Open (or focus) `path`. Opening an already open path in persistent
    /// mode promotes a transient view.
    fn open_file(&mut self, path: &Path, mode: OpenMode) -> Self::Handle;

    /// Path shown by the view, `None` once it was closed
    fn surface_path(&self, handle: Self::Handle) -> Option<PathBuf>;

    /// True while the view's content is still being loaded
    fn is_loading(&self, handle: Self::Handle) -> bool;

    fn is_transient(&self, handle: Self::Handle) -> bool;

    /// Absolute text offset of a 0-based `(row, column)` position
    fn text_point(&self, handle: Self::Handle, row: u64, column: usize) -> usize;

    fn scroll_to(&mut self, handle: Self::Handle, region: Span, animate: bool);

    /// Replace every region tagged `name`. An empty slice erases the tag.
    fn set_highlight(&mut self, handle: Self::Handle, name: &str, regions: &[Span]);

    fn set_cursor(&mut self, handle: Self::Handle, position: usize);

    /// Cursor offset of the view, `None` once it was closed
    fn cursor(&self, handle: Self::Handle) -> Option<usize>;

    /// Every open view, transient ones included
    fn surfaces(&self) -> Vec<Self::Handle>;

    /// The view holding focus
    fn active_surface(&self) -> Option<Self::Handle>;

    fn focus(&mut self, handle: Self::Handle);

    fn close_surface(&mut self, handle: Self::Handle);
}

/// Focus and cursors of the regular views when a session opened. Restored
/// when the session is dismissed without confirming, so previewing a file
/// the user already had open leaves no trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSnapshot<H> {
    active: Option<H>,
    cursors: Vec<(H, usize)>,
}

impl<H> Default for SurfaceSnapshot<H> {
    fn default() -> Self {
        Self {
            active: None,
            cursors: Vec::new(),
        }
    }
}

impl<H: Copy + Eq + Debug> SurfaceSnapshot<H> {
    /// Transient views are previews and are left out
    pub fn capture<S>(surface: &S) -> Self
    where
        S: EditorSurface<Handle = H>,
    {
        let cursors = surface
            .surfaces()
            .into_iter()
            .filter(|handle| !surface.is_transient(*handle))
            .filter_map(|handle| surface.cursor(handle).map(|cursor| (handle, cursor)))
            .collect();

        Self {
            active: surface.active_surface(),
            cursors,
        }
    }

    /// Views closed in the meantime are skipped
    pub fn restore<S>(&self, surface: &mut S)
    where
        S: EditorSurface<Handle = H>,
    {
        for &(handle, cursor) in &self.cursors {
            if surface.surface_path(handle).is_some() && surface.cursor(handle) != Some(cursor) {
                surface.set_cursor(handle, cursor);
            }
        }

        if let Some(active) = self.active
            && surface.surface_path(active).is_some()
            && surface.active_surface() != Some(active)
        {
            surface.focus(active);
        }
    }
}
