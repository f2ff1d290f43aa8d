//! Ticket system commands

use anyhow::Result;
use url::Url;

use super::output::Output;
use super::session::Session;
use crate::domain::TicketSystem;

pub fn add(session: &Session, output: &Output, id: &str, uri: Url, make_default: bool) -> Result<()> {
    let system = TicketSystem::new(id, uri, false)?;

    let changelog = session.update(|c| {
        let added = c.with_ticket_system(system)?;
        if make_default {
            added.with_default_ticket_system(id)
        } else {
            Ok(added)
        }
    })?;
    tracing::info!(id, default = make_default, "added ticket system");

    if output.is_json() {
        output.data(&changelog.ticket_systems().get(id));
    } else {
        output.success(&format!("Added ticket system {}", id));
    }
    Ok(())
}

pub fn set_default(session: &Session, output: &Output, id: &str) -> Result<()> {
    let changelog = session.update(|c| c.with_default_ticket_system(id))?;
    tracing::info!(id, "moved default ticket system");

    if output.is_json() {
        output.data(&changelog.ticket_systems().get(id));
    } else {
        output.success(&format!("Ticket system {} is now the default", id));
    }
    Ok(())
}
