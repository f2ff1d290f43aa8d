//! Changelog files on disk
//!
//! Writes go to `<path>.tmp` first and are renamed over the original, so a
//! crash mid-write never leaves a truncated changelog behind. There is no
//! locking: one process at a time is assumed.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::codec::{ChangelogDecoder, ChangelogEncoder};
use super::decoder::{DecodeError, XmlDecoder};
use super::diagnostics::DiagnosticSink;
use super::encoder::{EncodeError, XmlEncoder};
use crate::domain::{Changelog, ErrorKind};

/// The file name used when none is configured
pub const DEFAULT_FILE_NAME: &str = "README-CHANGES.xml";

#[derive(Debug, Error)]
pub enum FileError {
    #[error("Changelog not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Changelog already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("Failed to {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FileError::NotFound(_) => ErrorKind::NotFound,
            FileError::AlreadyExists(_) => ErrorKind::InvalidMutation,
            FileError::Decode(e) => e.kind(),
            FileError::Encode(e) => e.kind(),
            FileError::Io { .. } => ErrorKind::IoFailure,
        }
    }

    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        FileError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A changelog stored at a fixed path
pub struct ChangelogFile {
    path: PathBuf,
    decoder: Box<dyn ChangelogDecoder>,
    encoder: Box<dyn ChangelogEncoder>,
}

impl ChangelogFile {
    /// Uses the XML codec
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_codec(path, Box::new(XmlDecoder::new()), Box::new(XmlEncoder::new()))
    }

    pub fn with_codec(
        path: impl Into<PathBuf>,
        decoder: Box<dyn ChangelogDecoder>,
        encoder: Box<dyn ChangelogEncoder>,
    ) -> Self {
        Self {
            path: path.into(),
            decoder,
            encoder,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path writes are staged at before being renamed into place
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads and validates the changelog, reporting problems to `sink`
    pub fn load(&self, sink: &mut dyn DiagnosticSink) -> Result<Changelog, FileError> {
        let file = File::open(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FileError::NotFound(self.path.clone()),
            _ => FileError::io("open", &self.path, e),
        })?;

        let origin = self.path.display().to_string();
        let mut reader = BufReader::new(file);
        let changelog = self.decoder.decode(&origin, &mut reader, sink)?;

        tracing::debug!(
            path = %self.path.display(),
            releases = changelog.releases().len(),
            "loaded changelog"
        );
        Ok(changelog)
    }

    /// Writes a new changelog; fails if the file already exists
    pub fn create(&self, changelog: &Changelog) -> Result<(), FileError> {
        if self.exists() {
            return Err(FileError::AlreadyExists(self.path.clone()));
        }
        self.save(changelog)
    }

    /// Atomically replaces the file with `changelog`
    pub fn save(&self, changelog: &Changelog) -> Result<(), FileError> {
        let temp_path = self.temp_path();

        let result = self.write_temp(&temp_path, changelog).and_then(|()| {
            fs::rename(&temp_path, &self.path).map_err(|e| FileError::io("replace", &self.path, e))
        });

        if result.is_err() {
            // the original file is untouched; only the staging file may remain
            let _ = fs::remove_file(&temp_path);
            return result;
        }

        tracing::info!(path = %self.path.display(), "wrote changelog");
        Ok(())
    }

    fn write_temp(&self, temp_path: &Path, changelog: &Changelog) -> Result<(), FileError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| FileError::io("create directory", parent, e))?;
        }

        let file = File::create(temp_path).map_err(|e| FileError::io("create", temp_path, e))?;
        let mut writer = BufWriter::new(file);
        self.encoder.encode(changelog, &mut writer)?;

        let file = writer
            .into_inner()
            .map_err(|e| FileError::io("write", temp_path, e.into_error()))?;
        file.sync_all().map_err(|e| FileError::io("sync", temp_path, e))?;
        Ok(())
    }
}

impl std::fmt::Debug for ChangelogFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangelogFile").field("path", &self.path).finish()
    }
}
