//! XHTML table rendering
//!
//! Produces a single `table` element suitable for embedding in a page. Each
//! release contributes a heading row followed by one row per change; ticket
//! references link into the release's ticket system.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{RenderError, Renderer};
use crate::domain::{Change, Changelog, Release};
use crate::storage::schema::format_date;

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

#[derive(Debug, Default, Clone, Copy)]
pub struct XhtmlRenderer;

impl XhtmlRenderer {
    pub fn new() -> Self {
        Self
    }
}

struct Table<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> Table<W> {
    fn start(&mut self, name: &str) -> Result<(), RenderError> {
        self.writer.write_event(Event::Start(BytesStart::new(name)))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), RenderError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), RenderError> {
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn row_start(&mut self, date: &str) -> Result<(), RenderError> {
        self.start("tr")?;
        self.start("td")?;
        self.text(date)?;
        self.end("td")?;
        self.start("td")
    }

    fn row_end(&mut self) -> Result<(), RenderError> {
        self.end("td")?;
        self.end("tr")
    }

    fn release(&mut self, changelog: &Changelog, release: &Release) -> Result<(), RenderError> {
        self.row_start(&format_date(&release.date))?;
        self.text(&format!("Release: {} {}", changelog.project(), release.version))?;
        self.row_end()?;

        for change in &release.changes {
            self.change(changelog, release, change)?;
        }
        Ok(())
    }

    fn change(&mut self, changelog: &Changelog, release: &Release, change: &Change) -> Result<(), RenderError> {
        self.row_start(&format_date(&change.date))?;

        let mut summary = String::from("Change: ");
        if !change.backwards_compatible {
            summary.push_str("(Backwards incompatible) ");
        }
        if let Some(module) = &change.module {
            summary.push_str(module.as_str());
            summary.push_str(": ");
        }
        summary.push_str(&change.summary);
        self.text(&summary)?;

        if !change.tickets.is_empty() {
            let system = changelog.ticket_systems().get(&release.ticket_system);
            self.text(" (tickets: ")?;
            for (i, ticket) in change.tickets.iter().enumerate() {
                if i > 0 {
                    self.text(", ")?;
                }
                match system {
                    Some(system) => {
                        let href = system.ticket_link(ticket.as_str());
                        let link = BytesStart::new("a").with_attributes([("href", href.as_str())]);
                        self.writer.write_event(Event::Start(link))?;
                        self.text(ticket.as_str())?;
                        self.end("a")?;
                    }
                    None => self.text(ticket.as_str())?,
                }
            }
            self.text(")")?;
        }

        self.row_end()
    }
}

impl Renderer for XhtmlRenderer {
    fn render(&self, changelog: &Changelog, output: &mut dyn Write) -> Result<(), RenderError> {
        let mut table = Table {
            writer: Writer::new_with_indent(output, b' ', 2),
        };

        let summary = format!("Changes for project {}", changelog.project());
        let root = BytesStart::new("table").with_attributes([
            ("xmlns", XHTML_NAMESPACE),
            ("summary", summary.as_str()),
            ("class", "changelog"),
        ]);
        table.writer.write_event(Event::Start(root))?;

        for release in changelog.releases().values().rev() {
            table.release(changelog, release)?;
        }

        table.end("table")?;

        let output = table.writer.into_inner();
        output.write_all(b"\n")?;
        output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures;

    #[test]
    fn renders_table() {
        let text = XhtmlRenderer::new()
            .render_to_string(&fixtures::changelog())
            .unwrap();

        assert!(text.starts_with(
            r#"<table xmlns="http://www.w3.org/1999/xhtml" summary="Changes for project com.example" class="changelog">"#
        ));
        assert!(text.contains("<td>2024-04-03</td>"));
        assert!(text.contains("Release: com.example 1.0.0"));
        assert!(text.contains("Change: (Backwards incompatible) cli: Renamed options (tickets: "));
        assert!(text.contains(r#"<a href="https://github.com/example/issues/3">3</a>"#));
        assert!(text.contains(r#"<a href="https://github.com/example/issues/9">9</a>"#));
        assert!(text.trim_end().ends_with("</table>"));

        let newer = text.find("com.example 1.1.0").unwrap();
        let older = text.find("com.example 1.0.0").unwrap();
        assert!(newer < older);
    }

    #[test]
    fn empty_changelog_is_empty_table() {
        let changelog = fixtures::changelog().limit(0);
        let text = XhtmlRenderer::new().render_to_string(&changelog).unwrap();
        assert!(!text.contains("<tr>"));
        assert!(text.contains("</table>"));
    }
}
