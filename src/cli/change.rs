//! Change commands

use anyhow::Result;
use chrono::Utc;

use super::output::Output;
use super::session::Session;
use crate::domain::{Change, ChangelogError, ModuleName, TicketId};

pub fn add(
    session: &Session,
    output: &Output,
    summary: &str,
    module: Option<ModuleName>,
    tickets: Vec<TicketId>,
    incompatible: bool,
) -> Result<()> {
    let change = Change::new(Utc::now(), summary)?
        .with_module(module)
        .with_tickets(tickets)
        .with_backwards_compatible(!incompatible);

    let changelog = session.update(|c| c.add_change(change.clone()))?;
    let release = changelog.open_release().ok_or(ChangelogError::NoOpenRelease)?;
    tracing::info!(version = %release.version, changes = release.changes.len(), "appended change");

    if output.is_json() {
        output.data(&serde_json::json!({
            "release": release.version.to_string(),
            "change": change,
        }));
    } else {
        output.success(&format!("Added change to release {}", release.version));
    }
    Ok(())
}
