//! Server configuration, loaded from an optional TOML file.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

/// What exception completion offers when no `Exception` base class is known
/// to the index (for example before any stubs are indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExceptionFallback {
    /// Offer nothing; misleading candidates are worse than none.
    #[default]
    ShowNone,
    /// Offer every concrete class.
    ShowAll,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub completion: CompletionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CompletionConfig {
    pub exception_fallback: ExceptionFallback,
    /// Offer keyword/modifier snippet items alongside declarations.
    pub keyword_items: bool,
    /// Hard cap on produced candidates per request.
    pub max_candidates: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            exception_fallback: ExceptionFallback::default(),
            keyword_items: true,
            max_candidates: 2000,
        }
    }
}

impl Config {
    /// Read a config file, falling back to defaults when it is missing or
    /// malformed. A malformed file is logged, not fatal.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(err) => {
                    warn!(path = %path.display(), %err, "ignoring malformed config file");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let config = Config::load(Path::new("/nonexistent/phocus.toml"));
        assert_eq!(
            config.completion.exception_fallback,
            ExceptionFallback::ShowNone
        );
        assert!(config.completion.keyword_items);
    }

    #[test]
    fn parses_exception_fallback() {
        let config: Config =
            toml::from_str("[completion]\nexception-fallback = \"show-all\"\n").unwrap();
        assert_eq!(
            config.completion.exception_fallback,
            ExceptionFallback::ShowAll
        );
    }
}
