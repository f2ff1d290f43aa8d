//! # Storage Layer
//!
//! Persistence for changelogs: the markup codec and the file it lives in.
//!
//! ## Markup
//!
//! Changelogs are stored as XML in the `urn:com.io7m.changelog:4.0`
//! namespace, by default in `README-CHANGES.xml`. See [`schema`] for the
//! element structure.
//!
//! - [`XmlDecoder`] reads markup in one streaming pass, validating structure
//!   and invariants as it goes and reporting problems to a [`DiagnosticSink`]
//! - [`XmlEncoder`] writes the canonical form
//! - [`ChangelogDecoder`] / [`ChangelogEncoder`] are the seams
//!   [`ChangelogFile`] is built on
//!
//! ## Crash Safety
//!
//! [`ChangelogFile::save`] writes `<path>.tmp` and renames it over the
//! original. Nothing is locked; callers serialize access themselves.
//!
//! ## Configuration
//!
//! [`Config`] merges the global and project TOML files.

mod codec;
mod config;
mod decoder;
mod diagnostics;
mod encoder;
mod file;
pub mod schema;

pub use codec::{ChangelogDecoder, ChangelogEncoder};
pub use config::{AtomConfig, Config, ConfigError, OutputFormat, PlainConfig, PROJECT_CONFIG_FILE};
pub use decoder::{DecodeError, XmlDecoder};
pub use diagnostics::{Diagnostic, DiagnosticSink, LoggingSink, Position, Severity};
pub use encoder::{EncodeError, XmlEncoder};
pub use file::{ChangelogFile, FileError, DEFAULT_FILE_NAME};
