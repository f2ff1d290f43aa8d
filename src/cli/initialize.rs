//! Changelog creation

use anyhow::Result;
use url::Url;

use super::output::Output;
use super::session::Session;
use crate::domain::{Changelog, ProjectName, TicketSystem};

pub fn run(
    session: &Session,
    output: &Output,
    project: ProjectName,
    ticket_system_name: &str,
    ticket_system_uri: Url,
) -> Result<()> {
    let system = TicketSystem::new(ticket_system_name, ticket_system_uri, true)?;
    let changelog = Changelog::initialize(project, system);

    session.file().create(&changelog)?;
    let path = session.file().path().display();
    tracing::info!(path = %path, project = %changelog.project(), "created changelog");

    if output.is_json() {
        output.data(&serde_json::json!({
            "path": path.to_string(),
            "project": changelog.project(),
        }));
    } else {
        output.success(&format!("Created changelog {} for {}", path, changelog.project()));
    }
    Ok(())
}
