//! Builds the external command chain for a live search query.
//!
//! The grep stage is always ripgrep-compatible. When the fuzzy filter is
//! enabled its output is piped through a second `--filter` stage which
//! ranks lines by fuzzy relevance; the grep stage then only needs to cheaply
//! shrink the candidate set, which it does with a 3-gram prefilter.

use crate::config::{EngineConfig, OutputFormat};
use crate::path_utils;
use crate::prefilter::representative_trigrams;
use std::path::PathBuf;
use std::time::Duration;
use telescope_query_parser::{
    FixedFilterConfig, GlobFlag, GlobTranslator, LiveGrepConfig, ParseResult, QueryParser,
    parse_filter_list,
};
use tracing::{debug, warn};

/// Queries shorter than this never start a search.
pub const MIN_QUERY_CHARS: usize = 3;

/// Returns true when the query is long enough to be searched at all.
#[inline]
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_CHARS
}

/// Per-session file filter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Comma separated glob list (`.py, -*.min.js, views/*.html`). A single
    /// extension is just a one-entry list.
    pub globs: String,
    /// Parse `*.ext`, `-*.ext` and `type:` tokens out of the query text.
    /// When false only `~` is special and the rest is searched literally.
    pub query_globs: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            globs: String::new(),
            query_globs: true,
        }
    }
}

impl FilterConfig {
    pub fn with_globs(globs: impl Into<String>) -> Self {
        Self {
            globs: globs.into(),
            ..Default::default()
        }
    }
}

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Space separated command line, for logs only
    pub fn to_command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Search file contents, one result per matched line (or submatch)
    Content,
    /// Only list the files matching the glob constraints
    FilesOnly,
}

/// Bounds applied while consuming process output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_results: usize,
    pub max_display_chars: usize,
    pub timeout: Duration,
}

/// Everything needed to run one search
#[derive(Debug, Clone)]
pub struct SearchPlan {
    /// The raw query this plan was built from
    pub query: String,
    /// Literal search text, constraint tokens removed
    pub search_text: String,
    pub mode: SearchMode,
    /// Format of the *last* stage's output
    pub format: OutputFormat,
    pub roots: Vec<PathBuf>,
    pub globs: Vec<GlobFlag>,
    pub grep: CommandSpec,
    pub filter: Option<CommandSpec>,
    pub limits: SearchLimits,
}

pub struct QueryPlanner<'c> {
    config: &'c EngineConfig,
}

impl<'c> QueryPlanner<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        Self { config }
    }

    /// Build the command chain for `raw_query`. Returns `None` when there is
    /// nothing to search: the query is shorter than 3 characters, or it has
    /// neither search text nor a file filter.
    pub fn plan(
        &self,
        raw_query: &str,
        filters: &FilterConfig,
        roots: &[PathBuf],
    ) -> Option<SearchPlan> {
        let query = raw_query.trim();
        if !is_searchable(query) {
            debug!(query, "Query below minimum length, no search");
            return None;
        }

        let parsed = parse_query(query, filters.query_globs);
        let search_text = parsed.search_text();
        let has_user_filters =
            parsed.has_file_filters() || parse_filter_list(&filters.globs).next().is_some();

        let mode = if !search_text.is_empty() {
            SearchMode::Content
        } else if has_user_filters {
            SearchMode::FilesOnly
        } else {
            debug!(query, "Query has no search text and no filters");
            return None;
        };

        let roots = if parsed.uses_home_root() {
            match path_utils::home_dir() {
                Ok(home) => vec![home],
                Err(e) => {
                    warn!(error = %e, "Falling back to project roots");
                    roots.to_vec()
                }
            }
        } else {
            roots.to_vec()
        };

        let mut translator = GlobTranslator::new();
        translator
            .exclude_files(&self.config.binary_file_patterns)
            .exclude_files(&self.config.file_exclude_patterns)
            .exclude_folders(&self.config.folder_exclude_patterns)
            .filter_input(&filters.globs)
            .constraints(&parsed.constraints);
        let globs = translator.finish();

        let use_filter = self.config.fuzzy_filter && mode == SearchMode::Content;
        let format = match mode {
            SearchMode::FilesOnly => OutputFormat::Lines,
            // The fuzzy filter ranks raw lines, JSON records can't go through it.
            SearchMode::Content if use_filter => OutputFormat::Lines,
            SearchMode::Content => self.config.output_format,
        };

        let grep = match mode {
            SearchMode::FilesOnly => self.files_command(&globs, &roots),
            SearchMode::Content => {
                self.content_command(&search_text, use_filter, format, &globs, &roots)
            }
        };

        let filter = use_filter.then(|| {
            let mut filter = CommandSpec::new(&self.config.filter_binary);
            filter.arg("--filter").arg(&search_text);
            filter
        });

        debug!(
            grep = %grep.to_command_line(),
            filter = ?filter.as_ref().map(CommandSpec::to_command_line),
            "Planned search"
        );

        Some(SearchPlan {
            query: raw_query.to_string(),
            search_text,
            mode,
            format,
            roots,
            globs,
            grep,
            filter,
            limits: SearchLimits {
                max_results: self.config.max_results,
                max_display_chars: self.config.max_display_chars,
                timeout: self.config.search_timeout(),
            },
        })
    }

    fn common_flags(&self, cmd: &mut CommandSpec) {
        cmd.arg("--max-filesize")
            .arg(&self.config.max_file_size)
            .arg("--follow")
            .arg("--color")
            .arg("never");
    }

    fn files_command(&self, globs: &[GlobFlag], roots: &[PathBuf]) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.config.grep_binary);
        cmd.arg("--files");
        self.common_flags(&mut cmd);
        push_globs(&mut cmd, globs);
        push_roots(&mut cmd, roots);
        cmd
    }

    fn content_command(
        &self,
        search_text: &str,
        use_filter: bool,
        format: OutputFormat,
        globs: &[GlobFlag],
        roots: &[PathBuf],
    ) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.config.grep_binary);
        cmd.arg("--no-heading")
            // a single file root would otherwise drop the path prefix
            .arg("--with-filename")
            .arg("--line-number")
            .arg("--max-count")
            .arg(self.config.max_matches_per_file.to_string())
            .arg("--smart-case")
            .arg("--fixed-strings");
        self.common_flags(&mut cmd);

        if format == OutputFormat::Json {
            cmd.arg("--json");
        }

        push_globs(&mut cmd, globs);

        let grams = if use_filter {
            representative_trigrams(search_text)
        } else {
            Default::default()
        };

        if grams.is_empty() {
            cmd.arg("-e").arg(search_text);
        } else {
            for gram in grams {
                cmd.arg("-e").arg(gram);
            }
        }

        push_roots(&mut cmd, roots);
        cmd
    }
}

fn parse_query(query: &str, query_globs: bool) -> ParseResult<'_> {
    if query_globs {
        QueryParser::new(LiveGrepConfig).parse(query)
    } else {
        QueryParser::new(FixedFilterConfig).parse(query)
    }
}

fn push_globs(cmd: &mut CommandSpec, globs: &[GlobFlag]) {
    for glob in globs {
        cmd.args(glob.to_args());
    }
}

fn push_roots(cmd: &mut CommandSpec, roots: &[PathBuf]) {
    if roots.is_empty() {
        return;
    }
    cmd.arg("--");
    cmd.args(roots.iter().map(|r| r.to_string_lossy().into_owned()));
}
