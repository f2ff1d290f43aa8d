//! Releases and the changes they record
//!
//! A release moves through `open -> closed`. Changes are only appended while
//! a release is open and are never edited afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::changelog::ChangelogError;
use super::name::{ModuleName, TicketId};
use super::version::Version;

/// One changelog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// When the change was recorded
    pub date: DateTime<Utc>,

    /// Free-text summary (never empty)
    pub summary: String,

    /// The affected module, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleName>,

    /// False for backwards-incompatible changes
    pub backwards_compatible: bool,

    /// Referenced tickets in display order (duplicates allowed)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tickets: Vec<TicketId>,
}

impl Change {
    /// Creates a backwards-compatible change with no module or tickets
    pub fn new(date: DateTime<Utc>, summary: impl Into<String>) -> Result<Self, ChangelogError> {
        let summary = summary.into();
        if summary.trim().is_empty() {
            return Err(ChangelogError::EmptySummary);
        }

        Ok(Self {
            date,
            summary,
            module: None,
            backwards_compatible: true,
            tickets: Vec::new(),
        })
    }

    /// Sets the affected module
    pub fn with_module(mut self, module: Option<ModuleName>) -> Self {
        self.module = module;
        self
    }

    /// Sets the referenced tickets
    pub fn with_tickets(mut self, tickets: Vec<TicketId>) -> Self {
        self.tickets = tickets;
        self
    }

    /// Sets the compatibility flag
    pub fn with_backwards_compatible(mut self, compatible: bool) -> Self {
        self.backwards_compatible = compatible;
        self
    }
}

/// One version's worth of changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Release version (also the key in the changelog)
    pub version: Version,

    /// Release date; refreshed whenever the release is modified
    pub date: DateTime<Utc>,

    /// ID of the ticket system that ticket references resolve against
    pub ticket_system: String,

    /// Whether the release still accepts changes
    pub open: bool,

    /// Changes in the order they were added
    #[serde(default)]
    pub changes: Vec<Change>,
}

impl Release {
    /// Creates a new open release with no changes
    pub fn begin(version: Version, ticket_system: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            version,
            date: now,
            ticket_system: ticket_system.into(),
            open: true,
            changes: Vec::new(),
        }
    }

    /// Returns true if this release accepts changes
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Appends a change, refreshing the release date
    pub fn with_change(&self, change: Change, now: DateTime<Utc>) -> Result<Self, ChangelogError> {
        self.require_open()?;

        let mut release = self.clone();
        release.changes.push(change);
        release.date = now;
        Ok(release)
    }

    /// Closes the release, stamping the closing date
    pub fn finish(&self, now: DateTime<Utc>) -> Result<Self, ChangelogError> {
        self.require_open()?;

        Ok(Self {
            open: false,
            date: now,
            ..self.clone()
        })
    }

    /// Moves the release to a new version, keeping its changes
    pub fn with_version(&self, version: Version, now: DateTime<Utc>) -> Result<Self, ChangelogError> {
        self.require_open()?;

        Ok(Self {
            version,
            date: now,
            ..self.clone()
        })
    }

    /// Binds the release to a different ticket system
    pub fn with_ticket_system(&self, ticket_system: impl Into<String>, now: DateTime<Utc>) -> Result<Self, ChangelogError> {
        self.require_open()?;

        Ok(Self {
            ticket_system: ticket_system.into(),
            date: now,
            ..self.clone()
        })
    }

    /// Re-stamps the release date without touching its state
    pub fn touched(&self, now: DateTime<Utc>) -> Self {
        Self {
            date: now,
            ..self.clone()
        }
    }

    fn require_open(&self) -> Result<(), ChangelogError> {
        if self.open {
            Ok(())
        } else {
            Err(ChangelogError::ReleaseNotOpen(self.version.clone()))
        }
    }
}
