//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Group | Commands |
//! |-------|----------|
//! | Setup | `initialize` |
//! | Releases | `release-begin`, `release-finish`, `release-set-version`, `release-current`, `release-touch`, `release-set-ticket-system` |
//! | Changes | `change-add` |
//! | Ticket systems | `ticket-system-add`, `ticket-system-set-default` |
//! | Rendering | `write-atom`, `write-plain`, `write-xhtml` |
//!
//! Every command takes `--file` (or `CHANGELOG_FILE`), defaulting to the
//! configured file and then `README-CHANGES.xml`.
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! The `write-*` commands always print the rendered document.
//!
//! ## Logging
//!
//! Logs go to stderr. Use `--verbose` for debug output, or set
//! `CHANGELOG_LOG` to any `tracing` filter:
//! ```bash
//! CHANGELOG_LOG=changelog=trace changelog release-current
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod change;
mod initialize;
mod output;
mod release;
mod session;
mod ticket_system;
mod write;

pub use app::{init_logging, run, Cli, Commands, LOG_ENV};
pub use output::{Output, OutputFormat};
pub use session::Session;
pub use write::Selection;
