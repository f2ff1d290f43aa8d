//! Per-invocation state shared by every command

use std::path::PathBuf;

use anyhow::Result;

use crate::domain::{Changelog, ChangelogError};
use crate::storage::{ChangelogFile, Config, LoggingSink};

/// The resolved configuration and changelog file for one command
pub struct Session {
    pub config: Config,
    file: ChangelogFile,
}

impl Session {
    /// `file` overrides the configured changelog path
    pub fn new(config: Config, file: Option<PathBuf>) -> Self {
        let path = file.unwrap_or_else(|| config.changelog_file());
        tracing::debug!(path = %path.display(), "using changelog");
        Self {
            config,
            file: ChangelogFile::new(path),
        }
    }

    pub fn file(&self) -> &ChangelogFile {
        &self.file
    }

    /// Loads the changelog, logging any diagnostics
    pub fn load(&self) -> Result<Changelog> {
        Ok(self.file.load(&mut LoggingSink)?)
    }

    /// Atomically replaces the changelog file
    pub fn save(&self, changelog: &Changelog) -> Result<()> {
        Ok(self.file.save(changelog)?)
    }

    /// Loads, applies `change`, and saves; the file is untouched on failure
    pub fn update<F>(&self, change: F) -> Result<Changelog>
    where
        F: FnOnce(&Changelog) -> Result<Changelog, ChangelogError>,
    {
        let current = self.load()?;
        let updated = change(&current)?;
        self.save(&updated)?;
        Ok(updated)
    }
}
