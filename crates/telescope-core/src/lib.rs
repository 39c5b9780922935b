//! telescope-core - incremental live search over project files
//!
//! Every keystroke of a search prompt is coalesced by a per-session
//! debouncer, turned into a ripgrep (+ optional fuzzy filter) command chain,
//! run as an async task and parsed into a navigable result set. The
//! highlighted result is previewed in a transient editor surface.
//!
//! There is no global state: the host creates an [`Engine`] with its
//! [`EditorSurface`] and a [`SearchRunner`], then posts [`EngineEvent`]s.

pub mod config;
pub mod debounce;
pub mod engine;
mod error;
pub mod log;
pub mod navigator;
pub mod path_utils;
pub mod planner;
pub mod prefilter;
pub mod preview;
pub mod result_parser;
pub mod runner;
pub mod session;
pub mod surface;
pub mod types;

pub use config::{EngineConfig, OutputFormat, SelectionPolicy};
pub use engine::{Engine, EngineEvent, EngineUpdate};
pub use error::{Error, Result};
pub use navigator::ResultSetNavigator;
pub use planner::{CommandSpec, FilterConfig, QueryPlanner, SearchMode, SearchPlan};
pub use preview::{PreviewCoordinator, PreviewState};
pub use result_parser::ResultParser;
pub use runner::{RipgrepRunner, SearchRunner, SpawnedSearch};
pub use session::{SearchSession, SessionKey, SessionStore};
pub use surface::{EditorSurface, OpenMode, SurfaceSnapshot};
pub use types::{DisplayRow, DisplayText, ResultSet, SearchResult, Span};

// Re-export query parser types
pub use telescope_query_parser::{Constraint, GlobFlag, GlobTranslator, QueryParser};
