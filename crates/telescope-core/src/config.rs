//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config.
//! Out-of-range values are clamped (with a warning) instead of rejected.

use crate::error::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Shape of the grep tool's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `path:line:content`, rendered as inline rows
    #[default]
    Lines,
    /// ripgrep `--json` records, rendered into a display buffer
    Json,
}

/// What gets highlighted after a new result set lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Highlight (and preview) the first result
    #[default]
    First,
    /// Nothing is highlighted until the user navigates
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub debounce_ms: u64,
    pub max_results: usize,
    pub max_matches_per_file: usize,
    /// Passed to `--max-filesize` verbatim (`100M`, `512K`, ...)
    pub max_file_size: String,
    pub search_timeout_ms: u64,
    pub output_format: OutputFormat,
    /// Pipe grep output through the fuzzy filter stage
    pub fuzzy_filter: bool,
    pub selection: SelectionPolicy,
    pub grep_binary: String,
    pub filter_binary: String,
    pub highlight_name: String,
    pub max_display_chars: usize,
    pub binary_file_patterns: Vec<String>,
    pub file_exclude_patterns: Vec<String>,
    pub folder_exclude_patterns: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150,
            max_results: 50,
            max_matches_per_file: 10_000,
            max_file_size: "100M".to_string(),
            search_timeout_ms: 1_000,
            output_format: OutputFormat::Lines,
            fuzzy_filter: true,
            selection: SelectionPolicy::First,
            grep_binary: "rg".to_string(),
            filter_binary: "fzf".to_string(),
            highlight_name: "telescope-result-view".to_string(),
            max_display_chars: 200,
            binary_file_patterns: to_strings(&[
                "*.jpg", "*.jpeg", "*.png", "*.gif", "*.ico", "*.pdf", "*.zip",
            ]),
            file_exclude_patterns: to_strings(&[
                "*.pyc",
                "*.pyo",
                "*.o",
                "*.so",
                "*.dll",
                "*.class",
                ".DS_Store",
            ]),
            folder_exclude_patterns: to_strings(&[".git", ".svn", ".hg", "CVS"]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl EngineConfig {
    pub const MIN_DEBOUNCE_MS: u64 = 150;
    pub const MAX_DEBOUNCE_MS: u64 = 1_000;
    pub const MAX_RESULTS_CEILING: usize = 200;

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        Ok(config.validated())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        tracing::info!(path = %path.display(), "Loading engine config");
        Self::from_toml_str(&source)
    }

    /// Clamp values into the ranges the engine supports.
    pub fn validated(mut self) -> Self {
        let debounce_ms = self
            .debounce_ms
            .clamp(Self::MIN_DEBOUNCE_MS, Self::MAX_DEBOUNCE_MS);
        if debounce_ms != self.debounce_ms {
            tracing::warn!(
                requested = self.debounce_ms,
                used = debounce_ms,
                "debounce_ms out of range, clamping"
            );
            self.debounce_ms = debounce_ms;
        }

        let max_results = self.max_results.clamp(1, Self::MAX_RESULTS_CEILING);
        if max_results != self.max_results {
            tracing::warn!(
                requested = self.max_results,
                used = max_results,
                "max_results out of range, clamping"
            );
            self.max_results = max_results;
        }

        if self.max_display_chars == 0 {
            tracing::warn!("max_display_chars must be positive, using 200");
            self.max_display_chars = 200;
        }

        self
    }

    #[inline]
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[inline]
    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            debounce_ms = 500
            output_format = "json"
            selection = "none"
            folder_exclude_patterns = ["node_modules"]
            "#,
        )
        .unwrap();

        assert_eq!(config.debounce_window(), Duration::from_millis(500));
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.selection, SelectionPolicy::None);
        assert_eq!(config.folder_exclude_patterns, vec!["node_modules"]);
        assert_eq!(config.max_results, 50);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let config = EngineConfig::from_toml_str(
            r#"
            debounce_ms = 10
            max_results = 5000
            "#,
        )
        .unwrap();
        assert_eq!(config.debounce_ms, EngineConfig::MIN_DEBOUNCE_MS);
        assert_eq!(config.max_results, EngineConfig::MAX_RESULTS_CEILING);

        let config = EngineConfig {
            debounce_ms: 5_000,
            max_results: 0,
            ..Default::default()
        }
        .validated();
        assert_eq!(config.debounce_ms, EngineConfig::MAX_DEBOUNCE_MS);
        assert_eq!(config.max_results, 1);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(EngineConfig::from_toml_str("debounce_ms = \"soon\"").is_err());
    }
}
