//! Codec seams
//!
//! [`ChangelogFile`](super::ChangelogFile) is handed a decoder and an encoder
//! rather than choosing one itself, so tests and alternative formats can
//! substitute their own.

use std::io::{Read, Write};

use super::decoder::DecodeError;
use super::diagnostics::DiagnosticSink;
use super::encoder::EncodeError;
use crate::domain::Changelog;

/// Builds a changelog from serialized input
pub trait ChangelogDecoder {
    fn decode(
        &self,
        origin: &str,
        input: &mut dyn Read,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Changelog, DecodeError>;
}

/// Serializes a changelog
pub trait ChangelogEncoder {
    fn encode(&self, changelog: &Changelog, output: &mut dyn Write) -> Result<(), EncodeError>;
}
