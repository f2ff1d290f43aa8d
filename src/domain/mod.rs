//! Domain models for changelogs
//!
//! Contains the document model and release lifecycle without any I/O concerns.

mod changelog;
mod name;
mod release;
mod ticket_system;
mod version;

pub use changelog::{Changelog, ChangelogError, ErrorKind};
pub use name::{ModuleName, NameError, ProjectName, TicketId, MAX_NAME_LENGTH};
pub use release::{Change, Release};
pub use ticket_system::TicketSystem;
pub use version::{TextVersion, Version};
