//! Atom feed rendering
//!
//! One entry per release, newest first, titled `<project> <version> released`.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{RenderError, Renderer};
use crate::domain::{Changelog, Release};

const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// Feed-level metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomFeed {
    pub title: String,
    /// The feed's permanent identifier
    pub uri: String,
    pub author_name: String,
    pub author_email: String,
}

#[derive(Debug, Clone)]
pub struct AtomRenderer {
    feed: AtomFeed,
    updated: DateTime<Utc>,
}

impl AtomRenderer {
    /// `updated` is the feed's own timestamp, normally the current time
    pub fn new(feed: AtomFeed, updated: DateTime<Utc>) -> Self {
        Self { feed, updated }
    }
}

fn timestamp(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<(), RenderError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_entry<W: Write>(writer: &mut Writer<W>, changelog: &Changelog, release: &Release) -> Result<(), RenderError> {
    let version = release.version.to_string();
    let title = format!("{} {} released", changelog.project(), version);
    let date = timestamp(&release.date);

    writer.write_event(Event::Start(BytesStart::new("entry")))?;
    text_element(writer, "id", &version)?;
    text_element(writer, "updated", &date)?;
    text_element(writer, "published", &date)?;
    text_element(writer, "title", &title)?;

    let content = BytesStart::new("content").with_attributes([("type", "text")]);
    writer.write_event(Event::Start(content))?;
    writer.write_event(Event::Text(BytesText::new(&title)))?;
    writer.write_event(Event::End(BytesEnd::new("content")))?;

    writer.write_event(Event::End(BytesEnd::new("entry")))?;
    Ok(())
}

impl Renderer for AtomRenderer {
    fn render(&self, changelog: &Changelog, output: &mut dyn Write) -> Result<(), RenderError> {
        let mut writer = Writer::new_with_indent(output, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let feed = BytesStart::new("feed").with_attributes([("xmlns", ATOM_NAMESPACE)]);
        writer.write_event(Event::Start(feed))?;

        writer.write_event(Event::Start(BytesStart::new("author")))?;
        text_element(&mut writer, "name", &self.feed.author_name)?;
        text_element(&mut writer, "email", &self.feed.author_email)?;
        writer.write_event(Event::End(BytesEnd::new("author")))?;

        text_element(&mut writer, "id", &self.feed.uri)?;
        text_element(&mut writer, "title", &self.feed.title)?;
        text_element(&mut writer, "updated", &timestamp(&self.updated))?;

        for release in changelog.releases().values().rev() {
            write_entry(&mut writer, changelog, release)?;
        }

        writer.write_event(Event::End(BytesEnd::new("feed")))?;

        let output = writer.into_inner();
        output.write_all(b"\n")?;
        output.flush()?;
        Ok(())
    }
}
