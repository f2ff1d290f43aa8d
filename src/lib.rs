//! changelog - maintain a structured project changelog
//!
//! A changelog records a project's releases, the changes in each, and the
//! ticket systems those changes refer to. It is stored as validated XML and
//! edited one transition at a time: begin a release, add changes, finish it.
//! Finished changelogs can be rendered as plain text, Atom or XHTML.

pub mod cli;
pub mod domain;
pub mod render;
pub mod storage;

pub use domain::{Change, Changelog, ChangelogError, ErrorKind, Release, TicketSystem, Version};
