//! Plain text rendering
//!
//! ```text
//! Release: com.example 1.1.0
//! Change: Faster startup (Ticket: #9)
//! Release: com.example 1.0.0
//! Change: cli: (Backwards incompatible) Renamed options (Tickets: #3, #4)
//! Change: Initial release
//! ```

use std::io::Write;

use super::{RenderError, Renderer};
use crate::domain::{Change, Changelog};
use crate::storage::schema::format_date;

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainRenderer {
    /// Prefix every line with its `yyyy-MM-dd` date
    pub show_dates: bool,
}

impl PlainRenderer {
    pub fn new(show_dates: bool) -> Self {
        Self { show_dates }
    }

    fn write_change(&self, output: &mut dyn Write, change: &Change) -> Result<(), RenderError> {
        if self.show_dates {
            write!(output, "{} ", format_date(&change.date))?;
        }
        write!(output, "Change: ")?;
        if let Some(module) = &change.module {
            write!(output, "{}: ", module)?;
        }
        if !change.backwards_compatible {
            write!(output, "(Backwards incompatible) ")?;
        }
        write!(output, "{}", change.summary)?;

        if !change.tickets.is_empty() {
            let label = if change.tickets.len() == 1 { "Ticket" } else { "Tickets" };
            let tickets: Vec<String> = change.tickets.iter().map(|t| format!("#{}", t)).collect();
            write!(output, " ({}: {})", label, tickets.join(", "))?;
        }
        writeln!(output)?;
        Ok(())
    }
}

impl Renderer for PlainRenderer {
    fn render(&self, changelog: &Changelog, output: &mut dyn Write) -> Result<(), RenderError> {
        for release in changelog.releases().values().rev() {
            if self.show_dates {
                write!(output, "{} ", format_date(&release.date))?;
            }
            writeln!(output, "Release: {} {}", changelog.project(), release.version)?;

            // newest first; changes sharing a date keep their recorded order
            let mut changes: Vec<&Change> = release.changes.iter().collect();
            changes.sort_by(|a, b| b.date.cmp(&a.date));
            for change in changes {
                self.write_change(output, change)?;
            }
        }
        output.flush()?;
        Ok(())
    }
}
