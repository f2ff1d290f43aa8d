//! Structure of the changelog markup
//!
//! ```text
//! c:changelog @project
//! ├── c:ticket-systems
//! │   └── c:ticket-system @id @url @default?
//! └── c:releases
//!     └── c:release @version @date @ticket-system @is-open
//!         └── c:changes
//!             └── c:change @date @summary @module? @compatible?
//!                 └── c:tickets
//!                     └── c:ticket @id
//! ```
//!
//! Each element has exactly one legal parent. Container elements may
//! appear at most once under their parent; repeated elements any number of
//! times.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// The namespace every changelog element lives in
pub const NAMESPACE: &str = "urn:com.io7m.changelog:4.0";

/// The prefix the encoder binds [`NAMESPACE`] to
pub const PREFIX: &str = "c";

/// Persisted date format
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Markup elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Changelog,
    Releases,
    Release,
    Changes,
    Change,
    Tickets,
    Ticket,
    TicketSystems,
    TicketSystem,
}

impl Element {
    /// Looks up an element by its local (unprefixed) name
    pub fn from_local_name(name: &[u8]) -> Option<Self> {
        let element = match name {
            b"changelog" => Element::Changelog,
            b"releases" => Element::Releases,
            b"release" => Element::Release,
            b"changes" => Element::Changes,
            b"change" => Element::Change,
            b"tickets" => Element::Tickets,
            b"ticket" => Element::Ticket,
            b"ticket-systems" => Element::TicketSystems,
            b"ticket-system" => Element::TicketSystem,
            _ => return None,
        };
        Some(element)
    }

    /// The local name of this element
    pub fn name(self) -> &'static str {
        match self {
            Element::Changelog => "changelog",
            Element::Releases => "releases",
            Element::Release => "release",
            Element::Changes => "changes",
            Element::Change => "change",
            Element::Tickets => "tickets",
            Element::Ticket => "ticket",
            Element::TicketSystems => "ticket-systems",
            Element::TicketSystem => "ticket-system",
        }
    }

    /// The prefixed name the encoder writes
    pub fn qualified_name(self) -> String {
        format!("{}:{}", PREFIX, self.name())
    }

    /// The only element this one may appear under; `None` for the root
    pub fn parent(self) -> Option<Element> {
        match self {
            Element::Changelog => None,
            Element::Releases | Element::TicketSystems => Some(Element::Changelog),
            Element::Release => Some(Element::Releases),
            Element::Changes => Some(Element::Release),
            Element::Change => Some(Element::Changes),
            Element::Tickets => Some(Element::Change),
            Element::Ticket => Some(Element::Tickets),
            Element::TicketSystem => Some(Element::TicketSystems),
        }
    }

    /// Returns true for elements that may appear only once under their parent
    pub fn is_singular(self) -> bool {
        matches!(
            self,
            Element::Changelog
                | Element::Releases
                | Element::TicketSystems
                | Element::Changes
                | Element::Tickets
        )
    }

    pub fn required_attributes(self) -> &'static [&'static str] {
        match self {
            Element::Changelog => &["project"],
            Element::Release => &["version", "date", "ticket-system", "is-open"],
            Element::Change => &["date", "summary"],
            Element::Ticket => &["id"],
            Element::TicketSystem => &["id", "url"],
            Element::Releases | Element::Changes | Element::Tickets | Element::TicketSystems => &[],
        }
    }

    pub fn optional_attributes(self) -> &'static [&'static str] {
        match self {
            Element::Change => &["module", "compatible"],
            Element::TicketSystem => &["default"],
            _ => &[],
        }
    }

    /// Looks up a raw attribute name, returning its schema spelling if legal here
    pub fn attribute(self, name: &[u8]) -> Option<&'static str> {
        self.required_attributes()
            .iter()
            .chain(self.optional_attributes())
            .copied()
            .find(|known| known.as_bytes() == name)
    }
}

/// Parses a persisted `yyyy-MM-dd` date as midnight UTC
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(text, DATE_FORMAT).ok()?;
    Some(date.and_time(NaiveTime::MIN).and_utc())
}

/// Formats a timestamp as its UTC calendar day
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a markup boolean; only `true` and `false` are accepted
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
