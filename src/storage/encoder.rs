//! Streaming changelog encoder
//!
//! Output is canonical: ticket systems in ID order, then releases in
//! ascending version order, two-space indentation. Dates are written as
//! their UTC calendar day, so times of day do not survive a round trip.

use std::borrow::Cow;
use std::io::{self, Write};

use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use thiserror::Error;

use super::codec::ChangelogEncoder;
use super::schema::{format_date, Element, NAMESPACE, PREFIX};
use crate::domain::{Change, Changelog, ErrorKind, Release, TicketSystem};

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Failed to write changelog: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to write changelog markup: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl EncodeError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::IoFailure
    }
}

/// Encodes the `urn:com.io7m.changelog:4.0` markup
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlEncoder;

impl XmlEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Writes `changelog` to `output`
    pub fn encode<W: Write>(&self, changelog: &Changelog, output: W) -> Result<(), EncodeError> {
        let mut writer = Writer::new_with_indent(output, b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let namespace = format!("xmlns:{}", PREFIX);
        let root = start(Element::Changelog)
            .with_attributes([
                ("project", changelog.project().as_str()),
                (namespace.as_str(), NAMESPACE),
            ]);
        writer.write_event(Event::Start(root))?;

        writer.write_event(Event::Start(start(Element::TicketSystems)))?;
        for system in changelog.ticket_systems().values() {
            write_ticket_system(&mut writer, system)?;
        }
        writer.write_event(Event::End(end(Element::TicketSystems)))?;

        writer.write_event(Event::Start(start(Element::Releases)))?;
        for release in changelog.releases().values() {
            write_release(&mut writer, release)?;
        }
        writer.write_event(Event::End(end(Element::Releases)))?;

        writer.write_event(Event::End(end(Element::Changelog)))?;

        let mut output = writer.into_inner();
        output.write_all(b"\n")?;
        output.flush()?;
        Ok(())
    }

    /// Encodes `changelog` into a string
    pub fn encode_to_string(&self, changelog: &Changelog) -> Result<String, EncodeError> {
        let mut bytes = Vec::new();
        self.encode(changelog, &mut bytes)?;
        String::from_utf8(bytes).map_err(|e| EncodeError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

impl ChangelogEncoder for XmlEncoder {
    fn encode(&self, changelog: &Changelog, output: &mut dyn Write) -> Result<(), EncodeError> {
        XmlEncoder::encode(self, changelog, output)
    }
}

fn start(element: Element) -> BytesStart<'static> {
    BytesStart::new(element.qualified_name())
}

fn end(element: Element) -> BytesEnd<'static> {
    BytesEnd::new(element.qualified_name())
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Escapes free text for an attribute value
///
/// Tabs and line breaks become character references, which attribute-value
/// normalization leaves intact.
fn attribute_text(text: &str) -> Cow<'_, str> {
    let escaped = escape(text);
    if !escaped.contains(|c: char| matches!(c, '\t' | '\n' | '\r')) {
        return escaped;
    }

    let mut out = String::with_capacity(escaped.len() + 8);
    for c in escaped.chars() {
        match c {
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Pushes an attribute whose value is already escaped
fn push_text_attribute(element: &mut BytesStart<'_>, name: &str, value: &str) {
    let value = attribute_text(value);
    element.push_attribute(Attribute::from((name.as_bytes(), value.as_bytes())));
}

fn write_ticket_system<W: Write>(writer: &mut Writer<W>, system: &TicketSystem) -> Result<(), EncodeError> {
    let element = start(Element::TicketSystem).with_attributes([
        ("id", system.id.as_str()),
        ("url", system.uri.as_str()),
        ("default", bool_text(system.is_default)),
    ]);
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

fn write_release<W: Write>(writer: &mut Writer<W>, release: &Release) -> Result<(), EncodeError> {
    let date = format_date(&release.date);
    let version = release.version.to_string();
    let mut element = start(Element::Release).with_attributes([
        ("date", date.as_str()),
        ("is-open", bool_text(release.open)),
        ("ticket-system", release.ticket_system.as_str()),
    ]);
    push_text_attribute(&mut element, "version", &version);
    writer.write_event(Event::Start(element))?;

    if release.changes.is_empty() {
        writer.write_event(Event::Empty(start(Element::Changes)))?;
    } else {
        writer.write_event(Event::Start(start(Element::Changes)))?;
        for change in &release.changes {
            write_change(writer, change)?;
        }
        writer.write_event(Event::End(end(Element::Changes)))?;
    }

    writer.write_event(Event::End(end(Element::Release)))?;
    Ok(())
}

fn write_change<W: Write>(writer: &mut Writer<W>, change: &Change) -> Result<(), EncodeError> {
    let date = format_date(&change.date);
    let mut element = start(Element::Change);
    element.push_attribute(("date", date.as_str()));
    push_text_attribute(&mut element, "summary", &change.summary);
    if let Some(module) = &change.module {
        element.push_attribute(("module", module.as_str()));
    }
    if !change.backwards_compatible {
        element.push_attribute(("compatible", "false"));
    }

    if change.tickets.is_empty() {
        writer.write_event(Event::Empty(element))?;
        return Ok(());
    }

    writer.write_event(Event::Start(element))?;
    writer.write_event(Event::Start(start(Element::Tickets)))?;
    for ticket in &change.tickets {
        let ticket = start(Element::Ticket).with_attributes([("id", ticket.as_str())]);
        writer.write_event(Event::Empty(ticket))?;
    }
    writer.write_event(Event::End(end(Element::Tickets)))?;
    writer.write_event(Event::End(end(Element::Change)))?;
    Ok(())
}
