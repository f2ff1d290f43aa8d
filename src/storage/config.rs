//! Configuration handling
//!
//! Configuration is read from `~/.config/changelog/config.toml` (global) and
//! `.changelog.toml` in the working directory (project). Both are optional.
//! Project values override global ones key by key; command-line flags
//! override both.
//!
//! ```toml
//! file = "README-CHANGES.xml"
//! format = "text"
//!
//! [plain]
//! show_dates = true
//! count = 10
//!
//! [atom]
//! title = "Example releases"
//! uri = "https://example.com/releases.atom"
//! author_name = "Release Bot"
//! author_email = "releases@example.com"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::file::DEFAULT_FILE_NAME;

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = ".changelog.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse configuration {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Settings for `write-plain`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlainConfig {
    /// Prefix each line with its date
    pub show_dates: Option<bool>,

    /// Number of releases to show
    pub count: Option<usize>,
}

/// Feed metadata for `write-atom`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtomConfig {
    pub title: Option<String>,
    pub uri: Option<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

/// One configuration layer, or several merged together
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the changelog file
    pub file: Option<PathBuf>,

    /// Default output format
    pub format: Option<OutputFormat>,

    pub plain: PlainConfig,

    pub atom: AtomConfig,
}

impl Config {
    /// Loads the global configuration and the project configuration from
    /// the current directory
    pub fn load() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|source| ConfigError::Read {
            path: PathBuf::from("."),
            source,
        })?;
        Self::load_from(Self::global_config_path().as_deref(), &cwd)
    }

    /// Loads an optional global file and the project file in `project_dir`
    pub fn load_from(global: Option<&Path>, project_dir: &Path) -> Result<Self, ConfigError> {
        let global = match global {
            Some(path) => Self::read(path)?,
            None => None,
        };
        let project = Self::read(&project_dir.join(PROJECT_CONFIG_FILE))?;

        Ok(global.unwrap_or_default().merged(project.unwrap_or_default()))
    }

    /// Returns the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "io7m", "changelog").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Parses a single configuration file; `None` if it does not exist
    pub fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(Some(config))
    }

    /// Overlays `other` on top of `self`; set values in `other` win
    pub fn merged(self, other: Config) -> Config {
        Config {
            file: other.file.or(self.file),
            format: other.format.or(self.format),
            plain: PlainConfig {
                show_dates: other.plain.show_dates.or(self.plain.show_dates),
                count: other.plain.count.or(self.plain.count),
            },
            atom: AtomConfig {
                title: other.atom.title.or(self.atom.title),
                uri: other.atom.uri.or(self.atom.uri),
                author_name: other.atom.author_name.or(self.atom.author_name),
                author_email: other.atom.author_email.or(self.atom.author_email),
            },
        }
    }

    /// The changelog path, falling back to `README-CHANGES.xml`
    pub fn changelog_file(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME))
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.changelog_file(), PathBuf::from("README-CHANGES.xml"));
        assert_eq!(config.output_format(), OutputFormat::Text);
        assert_eq!(config.plain.show_dates, None);
    }

    #[test]
    fn parse_config() {
        let toml = r#"
file = "docs/CHANGES.xml"
format = "json"

[plain]
show_dates = true

[atom]
author_name = "Release Bot"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.changelog_file(), PathBuf::from("docs/CHANGES.xml"));
        assert_eq!(config.output_format(), OutputFormat::Json);
        assert_eq!(config.plain.show_dates, Some(true));
        assert_eq!(config.plain.count, None);
        assert_eq!(config.atom.author_name.as_deref(), Some("Release Bot"));
    }

    #[test]
    fn project_overrides_global_per_key() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        fs::write(
            &global,
            "format = \"json\"\n[plain]\ncount = 3\nshow_dates = true\n",
        )
        .unwrap();
        fs::write(dir.path().join(PROJECT_CONFIG_FILE), "[plain]\ncount = 5\n").unwrap();

        let config = Config::load_from(Some(&global), dir.path()).unwrap();
        assert_eq!(config.output_format(), OutputFormat::Json);
        assert_eq!(config.plain.count, Some(5));
        assert_eq!(config.plain.show_dates, Some(true));
    }

    #[test]
    fn missing_files_are_empty() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(Some(&dir.path().join("nope.toml")), dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn malformed_config_names_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_CONFIG_FILE), "format = [").unwrap();

        let err = Config::load_from(None, dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(PROJECT_CONFIG_FILE));
    }
}
