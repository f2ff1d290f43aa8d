//! Release lifecycle commands

use anyhow::Result;
use chrono::Utc;

use super::output::Output;
use super::session::Session;
use crate::domain::{ChangelogError, Release, Version};

fn release_json(release: &Release) -> serde_json::Value {
    serde_json::json!({
        "version": release.version.to_string(),
        "open": release.open,
        "date": release.date.format("%Y-%m-%d").to_string(),
        "ticket_system": release.ticket_system,
        "changes": release.changes.len(),
    })
}

pub fn begin(
    session: &Session,
    output: &Output,
    version: Option<Version>,
    ticket_system: Option<&str>,
) -> Result<()> {
    let changelog = session.update(|c| c.begin_release(version, ticket_system, Utc::now()))?;

    let release = changelog
        .open_release()
        .ok_or(ChangelogError::NoOpenRelease)?;
    tracing::info!(version = %release.version, ticket_system = %release.ticket_system, "began release");

    if output.is_json() {
        output.data(&release_json(release));
    } else {
        output.success(&format!("Began release {}", release.version));
    }
    Ok(())
}

pub fn finish(session: &Session, output: &Output, version: Option<Version>) -> Result<()> {
    let current = session.load()?;
    let changelog = current.finish_release(version.as_ref(), Utc::now())?;
    session.save(&changelog)?;

    // the finished release is the one that was open before
    let finished = current
        .find_release_or_latest_open(version.as_ref())
        .and_then(|r| changelog.release(&r.version))
        .ok_or(ChangelogError::NoOpenRelease)?;
    tracing::info!(version = %finished.version, "finished release");

    if output.is_json() {
        output.data(&release_json(finished));
    } else {
        output.success(&format!("Finished release {}", finished.version));
    }
    Ok(())
}

pub fn set_version(session: &Session, output: &Output, version: Version) -> Result<()> {
    let changelog = session.update(|c| c.set_release_version(version.clone(), Utc::now()))?;

    let release = changelog.release(&version).ok_or(ChangelogError::NoOpenRelease)?;
    tracing::info!(version = %release.version, "moved release");

    if output.is_json() {
        output.data(&release_json(release));
    } else {
        output.success(&format!("Release is now {}", release.version));
    }
    Ok(())
}

pub fn current(session: &Session, output: &Output) -> Result<()> {
    let changelog = session.load()?;
    let release = changelog.latest_release().ok_or(ChangelogError::NoReleases)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "version": release.version.to_string(),
            "open": release.open,
        }));
    } else {
        let state = if release.open { "open" } else { "closed" };
        println!("{} ({})", release.version, state);
    }
    Ok(())
}

pub fn touch(session: &Session, output: &Output) -> Result<()> {
    let changelog = session.update(|c| c.touch_latest(Utc::now()))?;

    let release = changelog.latest_release().ok_or(ChangelogError::NoReleases)?;
    tracing::debug!(version = %release.version, date = %release.date, "touched release");

    if output.is_json() {
        output.data(&release_json(release));
    } else {
        output.success(&format!(
            "Release {} dated {}",
            release.version,
            release.date.format("%Y-%m-%d")
        ));
    }
    Ok(())
}

pub fn set_ticket_system(session: &Session, output: &Output, ticket_system: &str) -> Result<()> {
    let changelog = session.update(|c| c.retarget_ticket_system(ticket_system, Utc::now()))?;

    let release = changelog.open_release().ok_or(ChangelogError::NoOpenRelease)?;
    tracing::info!(version = %release.version, ticket_system, "retargeted release");

    if output.is_json() {
        output.data(&release_json(release));
    } else {
        output.success(&format!(
            "Release {} now uses ticket system {}",
            release.version, release.ticket_system
        ));
    }
    Ok(())
}
