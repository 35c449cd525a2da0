//! Fertilikey - institution fertility & family benefits directory
//!
//! Loads a directory of institutions once per session, offers incremental
//! search over it, and renders the leave and fertility benefits of the
//! chosen institution.
//!
//! # Features
//!
//! - **One-shot directory load**: a single GET, cached for the session
//! - **Search as you type**: substring match on name or city, five suggestions
//! - **Keyboard selection**: arrow keys, Enter, Escape, reveal-all on Down
//! - **Detail view**: leave weeks, fertility coverage, sources with links
//! - **Search log**: fire-and-forget POST of each selection
//!
//! # Example
//!
//! ```no_run
//! use fertilikey::search::{Controller, NoFocus};
//! use fertilikey::AppConfig;
//!
//! fn main() -> fertilikey::Result<()> {
//!     let config = AppConfig::default();
//!     let mut store = config.directory_store()?;
//!     let directory = store.load()?;
//!
//!     let mut controller = Controller::new(config.controller_options())
//!         .with_directory(directory);
//!     controller.set_query("mercy", &mut NoFocus);
//!     for record in &controller.state().suggestions {
//!         println!("{} ({})", record.name, record.location());
//!     }
//!     Ok(())
//! }
//! ```

pub mod detail;
pub mod directory;
pub mod error;
pub mod logging;
pub mod search;
pub mod search_log;
pub mod tui;

// Re-export main types
pub use detail::{DetailView, ExpandedSections};
pub use directory::{
    Directory, DirectoryStore, FieldMapping, InstitutionRecord, LoadState, TriState,
};
pub use error::{FertilikeyError, FetchError, Result};
pub use search::{Controller, ControllerOptions, Phase, SearchState};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application configuration
///
/// Every field has a default, so a config file only needs the keys it
/// changes. Command-line flags are applied on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory listing endpoint
    pub endpoint: String,
    /// Where selections are POSTed; disabled when unset
    pub search_log_endpoint: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Wire field names
    pub mapping: FieldMapping,
    /// Suggestions shown while typing
    pub max_suggestions: usize,
    /// Query must be longer than this to search
    pub min_query_chars: usize,
    /// Collapsed height of the benefits text
    pub preview_lines: usize,
    /// Log file path
    pub log_file: Option<PathBuf>,
    /// Minimum log level name
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let options = ControllerOptions::default();
        Self {
            endpoint: "http://localhost:8000/api/institutions/".to_string(),
            search_log_endpoint: None,
            timeout_secs: 30,
            mapping: FieldMapping::default(),
            max_suggestions: options.max_suggestions,
            min_query_chars: options.min_query_chars,
            preview_lines: options.preview_lines,
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FertilikeyError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: AppConfig = serde_json::from_str(&text).map_err(|e| {
            FertilikeyError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the UI unusable.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(FertilikeyError::Config("endpoint must not be empty".into()));
        }
        if self.max_suggestions == 0 {
            return Err(FertilikeyError::Config("max_suggestions must be at least 1".into()));
        }
        if self.preview_lines == 0 {
            return Err(FertilikeyError::Config("preview_lines must be at least 1".into()));
        }
        if logging::LogLevel::parse(&self.log_level).is_none() {
            return Err(FertilikeyError::Config(format!(
                "unknown log level '{}'",
                self.log_level
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            max_suggestions: self.max_suggestions,
            min_query_chars: self.min_query_chars,
            preview_lines: self.preview_lines,
        }
    }

    /// Store wired to the configured endpoint. Nothing is fetched yet.
    pub fn directory_store(&self) -> Result<DirectoryStore> {
        let transport = directory::HttpTransport::new(&self.endpoint, self.timeout())?;
        Ok(DirectoryStore::new(Box::new(transport), self.mapping.clone()))
    }

    pub fn search_log(&self) -> Box<dyn search_log::SearchLogSink> {
        search_log::sink_for(self.search_log_endpoint.as_deref(), self.timeout())
    }

    pub fn log_level(&self) -> logging::LogLevel {
        logging::LogLevel::parse(&self.log_level).unwrap_or(logging::LogLevel::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_suggestions, 5);
        assert_eq!(config.min_query_chars, 2);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let name = format!("fertilikey-config-{}.json", std::process::id());
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{ "endpoint": "https://example.org/api/", "search_log_endpoint": "https://example.org/log/" }}"#
        )
        .unwrap();
        drop(file);

        let config = AppConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.endpoint, "https://example.org/api/");
        assert_eq!(config.search_log_endpoint.as_deref(), Some("https://example.org/log/"));
        assert_eq!(config.mapping, FieldMapping::default());
        assert_eq!(config.preview_lines, 3);
    }

    #[test]
    fn bad_values_are_config_errors() {
        let config = AppConfig {
            max_suggestions: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(FertilikeyError::Config(_))));

        let config = AppConfig {
            log_level: "loud".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(FertilikeyError::Config(_))));
    }

    #[test]
    fn unparsable_file_is_config_error() {
        let name = format!("fertilikey-bad-config-{}.json", std::process::id());
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, "{ not json").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, FertilikeyError::Config(_)));
        assert!(err.to_string().contains("cannot parse"));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = AppConfig::load(Path::new("/nonexistent/fertilikey.json")).unwrap_err();
        assert!(matches!(err, FertilikeyError::Config(_)));
    }
}
