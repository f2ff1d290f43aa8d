//! Streaming changelog decoder
//!
//! Reads the markup in a single forward pass. Every element pushes a
//! [`Frame`] holding a builder for the value it describes; when the element
//! closes, the builder is finalized and attached to the frame beneath it.
//!
//! Problems are reported to a [`DiagnosticSink`]. Warnings are informational,
//! errors fail the decode once the input is exhausted, and critical problems
//! (malformed markup, a foreign namespace, a second open release) stop
//! reading immediately.

use std::collections::BTreeMap;
use std::io::{self, BufReader, Read};

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use url::Url;

use super::codec::ChangelogDecoder;
use super::diagnostics::{Diagnostic, DiagnosticSink, Position, Severity};
use super::schema::{self, Element, NAMESPACE};
use crate::domain::{
    Change, Changelog, ErrorKind, ModuleName, ProjectName, Release, TicketId, TicketSystem, Version,
};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{origin} - At least one error was encountered during parsing and/or validation")]
    Invalid { origin: String },

    #[error("{origin} - Failed to read changelog")]
    Io {
        origin: String,
        #[source]
        source: io::Error,
    },
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::Invalid { .. } => ErrorKind::MalformedInput,
            DecodeError::Io { .. } => ErrorKind::IoFailure,
        }
    }
}

/// Decodes the `urn:com.io7m.changelog:4.0` markup
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlDecoder;

impl XmlDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decodes a changelog, naming `origin` in every diagnostic
    pub fn decode<R: Read>(
        &self,
        origin: &str,
        input: R,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Changelog, DecodeError> {
        let mut parse = Parse::new(origin, input, sink);
        match parse.run() {
            Ok(()) | Err(Halt::Critical) => parse.finish(),
            Err(Halt::Io(source)) => Err(DecodeError::Io {
                origin: origin.to_string(),
                source,
            }),
        }
    }

    pub fn decode_str(
        &self,
        origin: &str,
        text: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Changelog, DecodeError> {
        self.decode(origin, text.as_bytes(), sink)
    }
}

impl ChangelogDecoder for XmlDecoder {
    fn decode(
        &self,
        origin: &str,
        input: &mut dyn Read,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Changelog, DecodeError> {
        XmlDecoder::decode(self, origin, input, sink)
    }
}

/// Records newline offsets so byte positions can be reported as line/column
struct LineCounter<R> {
    inner: R,
    consumed: u64,
    newlines: Vec<u64>,
}

impl<R> LineCounter<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            consumed: 0,
            newlines: Vec::new(),
        }
    }

    fn line_column(&self, offset: u64) -> (u64, u64) {
        let line = self.newlines.partition_point(|&newline| newline < offset);
        let line_start = match line {
            0 => 0,
            n => self.newlines[n - 1] + 1,
        };
        (line as u64 + 1, offset - line_start + 1)
    }
}

impl<R: Read> Read for LineCounter<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        for (i, byte) in buf[..n].iter().enumerate() {
            if *byte == b'\n' {
                self.newlines.push(self.consumed + i as u64);
            }
        }
        self.consumed += n as u64;
        Ok(n)
    }
}

/// Why the event loop stopped early
enum Halt {
    Critical,
    Io(io::Error),
}

#[derive(Default)]
struct ChangelogBuilder {
    project: Option<ProjectName>,
    releases: BTreeMap<Version, Release>,
    ticket_systems: BTreeMap<String, TicketSystem>,
}

#[derive(Default)]
struct ReleaseBuilder {
    version: Option<Version>,
    date: Option<DateTime<Utc>>,
    ticket_system: Option<String>,
    open: Option<bool>,
    changes: Vec<Change>,
}

impl ReleaseBuilder {
    fn build(self) -> Option<Release> {
        Some(Release {
            version: self.version?,
            date: self.date?,
            ticket_system: self.ticket_system?,
            open: self.open?,
            changes: self.changes,
        })
    }
}

struct ChangeBuilder {
    date: Option<DateTime<Utc>>,
    summary: Option<String>,
    module: Option<ModuleName>,
    compatible: bool,
    tickets: Vec<TicketId>,
}

impl ChangeBuilder {
    fn build(self) -> Option<Change> {
        let change = Change::new(self.date?, self.summary?).ok()?;
        Some(
            change
                .with_module(self.module)
                .with_backwards_compatible(self.compatible)
                .with_tickets(self.tickets),
        )
    }
}

/// Parse state for one open element
enum Frame {
    Changelog(ChangelogBuilder),
    Releases(BTreeMap<Version, Release>),
    Release(ReleaseBuilder),
    Changes(Vec<Change>),
    Change(ChangeBuilder),
    Tickets(Vec<TicketId>),
    Ticket(Option<TicketId>),
    TicketSystems(BTreeMap<String, TicketSystem>),
    TicketSystem(Option<TicketSystem>),
    /// An element that was rejected; its whole subtree is ignored
    Skipped,
}

impl Frame {
    fn element(&self) -> Option<Element> {
        let element = match self {
            Frame::Changelog(_) => Element::Changelog,
            Frame::Releases(_) => Element::Releases,
            Frame::Release(_) => Element::Release,
            Frame::Changes(_) => Element::Changes,
            Frame::Change(_) => Element::Change,
            Frame::Tickets(_) => Element::Tickets,
            Frame::Ticket(_) => Element::Ticket,
            Frame::TicketSystems(_) => Element::TicketSystems,
            Frame::TicketSystem(_) => Element::TicketSystem,
            Frame::Skipped => return None,
        };
        Some(element)
    }
}

/// Namespace declarations made on one element
#[derive(Default)]
struct Bindings {
    prefixes: Vec<Vec<u8>>,
    default_namespace: bool,
}

impl Bindings {
    fn binds(&self, prefix: Option<&[u8]>) -> bool {
        match prefix {
            Some(prefix) => self.prefixes.iter().any(|p| p.as_slice() == prefix),
            None => self.default_namespace,
        }
    }
}

struct Level {
    frame: Frame,
    position: Position,
    /// Child elements seen so far, for singular-element checks
    children: Vec<Element>,
    /// Declarations in scope until this element closes
    bindings: Bindings,
}

/// Attribute values of one element, keyed by schema name
type Attributes = BTreeMap<&'static str, String>;

struct Parse<'s, R> {
    origin: String,
    reader: Reader<BufReader<LineCounter<R>>>,
    sink: &'s mut dyn DiagnosticSink,
    stack: Vec<Level>,
    root: Option<ChangelogBuilder>,
    root_seen: bool,
    open_releases: usize,
    failed: bool,
    end: u64,
}

impl<'s, R: Read> Parse<'s, R> {
    fn new(origin: &str, input: R, sink: &'s mut dyn DiagnosticSink) -> Self {
        Self {
            origin: origin.to_string(),
            reader: Reader::from_reader(BufReader::new(LineCounter::new(input))),
            sink,
            stack: Vec::new(),
            root: None,
            root_seen: false,
            open_releases: 0,
            failed: false,
            end: 0,
        }
    }

    fn position(&self, offset: u64) -> Position {
        let (line, column) = self.reader.get_ref().get_ref().line_column(offset);
        Position {
            source: self.origin.clone(),
            line,
            column,
        }
    }

    fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity.is_failure() {
            self.failed = true;
        }
        self.sink.report(&diagnostic);
    }

    fn report(&mut self, position: &Position, severity: Severity, message: String) -> Result<(), Halt> {
        self.emit(Diagnostic::new(position.clone(), severity, message));
        match severity {
            Severity::Critical => Err(Halt::Critical),
            _ => Ok(()),
        }
    }

    fn error(&mut self, position: &Position, message: String) -> Result<(), Halt> {
        self.report(position, Severity::Error, message)
    }

    fn critical(&mut self, position: &Position, message: &str, cause: impl std::fmt::Display) -> Halt {
        self.emit(Diagnostic::new(position.clone(), Severity::Critical, message).with_cause(cause));
        Halt::Critical
    }

    fn run(&mut self) -> Result<(), Halt> {
        let mut buf = Vec::new();
        loop {
            let offset = self.reader.buffer_position() as u64;
            let event = match self.reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(quick_xml::Error::Io(e)) => {
                    return Err(Halt::Io(io::Error::new(e.kind(), e.to_string())));
                }
                Err(e) => {
                    let position = self.position(self.reader.error_position() as u64);
                    return Err(self.critical(&position, "Malformed markup", e));
                }
            };

            match event {
                Event::Start(start) => self.start_element(offset, &start)?,
                Event::Empty(start) => {
                    self.start_element(offset, &start)?;
                    self.end_element(offset)?;
                }
                Event::End(_) => self.end_element(offset)?,
                Event::Text(text) => {
                    if !text.iter().all(u8::is_ascii_whitespace) {
                        let position = self.position(offset);
                        self.report(&position, Severity::Warning, "Ignoring unexpected text".to_string())?;
                    }
                }
                Event::CData(_) => {
                    let position = self.position(offset);
                    self.report(&position, Severity::Warning, "Ignoring unexpected CDATA section".to_string())?;
                }
                Event::DocType(_) => {
                    let position = self.position(offset);
                    return Err(self.critical(
                        &position,
                        "Document type declarations are not permitted",
                        "DOCTYPE",
                    ));
                }
                Event::Eof => {
                    self.end = offset;
                    break;
                }
                // declarations, comments, processing instructions, references
                _ => {}
            }
            buf.clear();
        }

        if let Some(level) = self.stack.last() {
            let position = level.position.clone();
            let name = level.frame.element().map_or("element", Element::name);
            let halt = self.critical(&position, "Unexpected end of document", format!("unclosed {}", name));
            return Err(halt);
        }
        Ok(())
    }

    fn start_element(&mut self, offset: u64, start: &BytesStart<'_>) -> Result<(), Halt> {
        let position = self.position(offset);
        let (attributes, bindings) = self.read_attributes(&position, start)?;

        let qname = start.name();
        let local = qname.local_name();
        tracing::trace!(
            element = %String::from_utf8_lossy(local.as_ref()),
            line = position.line,
            column = position.column,
            "start element"
        );

        if matches!(self.stack.last(), Some(Level { frame: Frame::Skipped, .. })) {
            return self.push(Frame::Skipped, position, bindings);
        }

        let in_namespace = match qname.prefix() {
            Some(prefix) => self.is_bound(&bindings, Some(prefix.as_ref())),
            None => self.is_bound(&bindings, None),
        };
        let display_name = String::from_utf8_lossy(qname.as_ref()).into_owned();
        if !in_namespace {
            self.error(
                &position,
                format!("Element '{}' is not in namespace {}", display_name, NAMESPACE),
            )?;
            return self.push(Frame::Skipped, position, bindings);
        }

        let Some(element) = Element::from_local_name(local.as_ref()) else {
            self.error(&position, format!("Unknown element '{}'", display_name))?;
            return self.push(Frame::Skipped, position, bindings);
        };

        if !self.check_placement(&position, element)? {
            return self.push(Frame::Skipped, position, bindings);
        }

        let attributes = self.check_attributes(&position, element, attributes)?;
        let frame = self.open_frame(&position, element, attributes)?;
        self.push(frame, position, bindings)
    }

    /// True if `prefix` is bound on the element itself or an open ancestor
    fn is_bound(&self, own: &Bindings, prefix: Option<&[u8]>) -> bool {
        own.binds(prefix) || self.stack.iter().any(|level| level.bindings.binds(prefix))
    }

    /// Decodes every attribute, separating out namespace declarations
    fn read_attributes(
        &mut self,
        position: &Position,
        start: &BytesStart<'_>,
    ) -> Result<(Vec<(Vec<u8>, String)>, Bindings), Halt> {
        let mut attributes = Vec::new();
        let mut bindings = Bindings::default();

        for attribute in start.attributes() {
            let attribute = match attribute {
                Ok(attribute) => attribute,
                Err(e) => return Err(self.critical(position, "Malformed attribute", e)),
            };
            let value = match attribute.decode_and_unescape_value(self.reader.decoder()) {
                Ok(value) => value.into_owned(),
                Err(e) => return Err(self.critical(position, "Malformed attribute value", e)),
            };

            let key = attribute.key.as_ref();
            let binding = if key == b"xmlns" {
                Some(None)
            } else {
                key.strip_prefix(b"xmlns:").map(Some)
            };

            match binding {
                Some(prefix) => {
                    if value != NAMESPACE {
                        let received = format!("expected {}, received {}", NAMESPACE, value);
                        return Err(self.critical(position, "Unexpected document type", received));
                    }
                    match prefix {
                        Some(prefix) => bindings.prefixes.push(prefix.to_vec()),
                        None => bindings.default_namespace = true,
                    }
                }
                None => attributes.push((key.to_vec(), value)),
            }
        }

        Ok((attributes, bindings))
    }

    /// Checks that `element` may appear where it does; returns false if not
    fn check_placement(&mut self, position: &Position, element: Element) -> Result<bool, Halt> {
        let Some(top) = self.stack.last_mut() else {
            if element != Element::Changelog {
                self.error(
                    position,
                    format!("Expected root element '{}' but found '{}'", Element::Changelog.name(), element.name()),
                )?;
                return Ok(false);
            }
            if self.root_seen {
                self.error(position, "Multiple root elements".to_string())?;
                return Ok(false);
            }
            self.root_seen = true;
            return Ok(true);
        };

        let parent = top.frame.element();
        if element.parent() != parent {
            let parent = parent.map_or("document", Element::name);
            self.error(
                position,
                format!("Element '{}' is not permitted inside '{}'", element.name(), parent),
            )?;
            return Ok(false);
        }

        if element.is_singular() && top.children.contains(&element) {
            self.error(position, format!("Duplicate element '{}'", element.name()))?;
            return Ok(false);
        }
        top.children.push(element);
        Ok(true)
    }

    /// Rejects unknown attributes and reports missing required ones
    fn check_attributes(
        &mut self,
        position: &Position,
        element: Element,
        raw: Vec<(Vec<u8>, String)>,
    ) -> Result<Attributes, Halt> {
        let mut attributes = Attributes::new();

        for (key, value) in raw {
            match element.attribute(&key) {
                Some(name) => {
                    attributes.insert(name, value);
                }
                None => self.error(
                    position,
                    format!(
                        "Unknown attribute '{}' on element '{}'",
                        String::from_utf8_lossy(&key),
                        element.name()
                    ),
                )?,
            }
        }

        for name in element.required_attributes() {
            if !attributes.contains_key(name) {
                self.error(
                    position,
                    format!("Missing required attribute '{}' on element '{}'", name, element.name()),
                )?;
            }
        }

        Ok(attributes)
    }

    fn open_frame(
        &mut self,
        position: &Position,
        element: Element,
        mut attributes: Attributes,
    ) -> Result<Frame, Halt> {
        let frame = match element {
            Element::Changelog => {
                let project = match attributes.remove("project") {
                    Some(value) => self.parsed(position, ProjectName::new(value))?,
                    None => None,
                };
                Frame::Changelog(ChangelogBuilder {
                    project,
                    ..ChangelogBuilder::default()
                })
            }
            Element::Releases => Frame::Releases(BTreeMap::new()),
            Element::Release => Frame::Release(self.open_release(position, attributes)?),
            Element::Changes => Frame::Changes(Vec::new()),
            Element::Change => Frame::Change(self.open_change(position, attributes)?),
            Element::Tickets => Frame::Tickets(Vec::new()),
            Element::Ticket => {
                let id = match attributes.remove("id") {
                    Some(value) => self.parsed(position, TicketId::new(value))?,
                    None => None,
                };
                Frame::Ticket(id)
            }
            Element::TicketSystems => Frame::TicketSystems(BTreeMap::new()),
            Element::TicketSystem => Frame::TicketSystem(self.open_ticket_system(position, attributes)?),
        };
        Ok(frame)
    }

    fn open_release(&mut self, position: &Position, mut attributes: Attributes) -> Result<ReleaseBuilder, Halt> {
        let mut release = ReleaseBuilder {
            version: attributes.remove("version").map(|v| Version::parse(&v)),
            ticket_system: attributes.remove("ticket-system"),
            ..ReleaseBuilder::default()
        };

        if let Some(value) = attributes.remove("date") {
            release.date = self.date(position, &value)?;
        }
        if let Some(value) = attributes.remove("is-open") {
            release.open = self.boolean(position, "is-open", &value)?;
        }

        if release.open == Some(true) {
            self.open_releases += 1;
            if self.open_releases > 1 {
                self.report(
                    position,
                    Severity::Critical,
                    "At most one release may be open at any given time".to_string(),
                )?;
            }
        }

        Ok(release)
    }

    fn open_change(&mut self, position: &Position, mut attributes: Attributes) -> Result<ChangeBuilder, Halt> {
        let mut change = ChangeBuilder {
            date: None,
            summary: None,
            module: None,
            compatible: true,
            tickets: Vec::new(),
        };

        if let Some(value) = attributes.remove("date") {
            change.date = self.date(position, &value)?;
        }
        if let Some(value) = attributes.remove("summary") {
            if value.trim().is_empty() {
                self.error(position, "Change summary must not be empty".to_string())?;
            } else {
                change.summary = Some(value);
            }
        }
        if let Some(value) = attributes.remove("module") {
            change.module = self.parsed(position, ModuleName::new(value))?;
        }
        if let Some(value) = attributes.remove("compatible") {
            change.compatible = self.boolean(position, "compatible", &value)?.unwrap_or(true);
        }

        Ok(change)
    }

    fn open_ticket_system(
        &mut self,
        position: &Position,
        mut attributes: Attributes,
    ) -> Result<Option<TicketSystem>, Halt> {
        let is_default = match attributes.remove("default") {
            Some(value) => self.boolean(position, "default", &value)?.unwrap_or(false),
            None => false,
        };
        let uri = match attributes.remove("url") {
            Some(value) => self.parsed(position, Url::parse(&value))?,
            None => None,
        };

        match (attributes.remove("id"), uri) {
            (Some(id), Some(uri)) => self.parsed(position, TicketSystem::new(id, uri, is_default)),
            _ => Ok(None),
        }
    }

    /// Reports a failed attribute conversion as an error
    fn parsed<T, E: std::fmt::Display>(&mut self, position: &Position, result: Result<T, E>) -> Result<Option<T>, Halt> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                self.error(position, e.to_string())?;
                Ok(None)
            }
        }
    }

    fn date(&mut self, position: &Position, value: &str) -> Result<Option<DateTime<Utc>>, Halt> {
        let date = schema::parse_date(value);
        if date.is_none() {
            self.error(position, format!("Invalid date '{}': expected yyyy-MM-dd", value))?;
        }
        Ok(date)
    }

    fn boolean(&mut self, position: &Position, name: &str, value: &str) -> Result<Option<bool>, Halt> {
        let parsed = schema::parse_bool(value);
        if parsed.is_none() {
            self.error(
                position,
                format!("Invalid value '{}' for attribute '{}': expected true or false", value, name),
            )?;
        }
        Ok(parsed)
    }

    fn push(&mut self, frame: Frame, position: Position, bindings: Bindings) -> Result<(), Halt> {
        self.stack.push(Level {
            frame,
            position,
            children: Vec::new(),
            bindings,
        });
        Ok(())
    }

    fn end_element(&mut self, offset: u64) -> Result<(), Halt> {
        let Some(level) = self.stack.pop() else {
            return Ok(());
        };
        tracing::trace!(
            element = level.frame.element().map_or("(skipped)", Element::name),
            offset,
            "end element"
        );

        let parent = self.stack.last_mut().map(|l| &mut l.frame);
        match (level.frame, parent) {
            (Frame::Changelog(builder), _) => self.root = Some(builder),
            (Frame::Releases(releases), Some(Frame::Changelog(builder))) => builder.releases = releases,
            (Frame::TicketSystems(systems), Some(Frame::Changelog(builder))) => {
                builder.ticket_systems = systems
            }
            (Frame::Release(builder), Some(Frame::Releases(releases))) => {
                if let Some(release) = builder.build() {
                    if releases.contains_key(&release.version) {
                        let message = format!("Duplicate release version {}", release.version);
                        self.error(&level.position, message)?;
                    } else {
                        releases.insert(release.version.clone(), release);
                    }
                }
            }
            (Frame::Changes(changes), Some(Frame::Release(builder))) => builder.changes = changes,
            (Frame::Change(builder), Some(Frame::Changes(changes))) => changes.extend(builder.build()),
            (Frame::Tickets(tickets), Some(Frame::Change(builder))) => builder.tickets = tickets,
            (Frame::Ticket(id), Some(Frame::Tickets(tickets))) => tickets.extend(id),
            (Frame::TicketSystem(system), Some(Frame::TicketSystems(systems))) => {
                if let Some(system) = system {
                    if systems.contains_key(&system.id) {
                        let message = format!("Duplicate ticket system '{}'", system.id);
                        self.error(&level.position, message)?;
                    } else {
                        systems.insert(system.id.clone(), system);
                    }
                }
            }
            // skipped subtrees, and children of skipped parents
            _ => {}
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Changelog, DecodeError> {
        let invalid = DecodeError::Invalid {
            origin: self.origin.clone(),
        };

        if self.failed {
            return Err(invalid);
        }

        let position = self.position(self.end);
        let Some(root) = self.root.take() else {
            let message = format!("Missing root element '{}'", Element::Changelog.name());
            self.emit(Diagnostic::new(position, Severity::Error, message));
            return Err(invalid);
        };
        let Some(project) = root.project else {
            return Err(invalid);
        };

        match Changelog::new(project, root.releases.into_values(), root.ticket_systems.into_values()) {
            Ok(changelog) => Ok(changelog),
            Err(e) => {
                self.emit(Diagnostic::new(position, Severity::Error, e.to_string()));
                Err(invalid)
            }
        }
    }
}
