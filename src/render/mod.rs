//! # Renderers
//!
//! Read-only views of a finished [`Changelog`]:
//!
//! | Renderer | Output |
//! |----------|--------|
//! | [`PlainRenderer`] | One line per release and change, newest first |
//! | [`AtomRenderer`] | An Atom feed with one entry per release |
//! | [`XhtmlRenderer`] | A `table class="changelog"` fragment |
//!
//! Renderers never modify the changelog. Use [`Changelog::limit`] or
//! [`Changelog::up_to_and_including`] to select what they show.

use std::io::{self, Write};

use thiserror::Error;

use crate::domain::Changelog;

mod atom;
mod plain;
mod xhtml;

pub use atom::{AtomFeed, AtomRenderer};
pub use plain::PlainRenderer;
pub use xhtml::XhtmlRenderer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to write markup: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Produces a derived view of a changelog
pub trait Renderer {
    fn render(&self, changelog: &Changelog, output: &mut dyn Write) -> Result<(), RenderError>;

    /// Renders into a string
    fn render_to_string(&self, changelog: &Changelog) -> Result<String, RenderError> {
        let mut bytes = Vec::new();
        self.render(changelog, &mut bytes)?;
        String::from_utf8(bytes).map_err(|e| RenderError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}
