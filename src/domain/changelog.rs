//! The changelog document
//!
//! A [`Changelog`] owns its releases and ticket systems and enforces the
//! cross-entity invariants on every construction and mutation:
//!
//! 1. At most one release is open.
//! 2. Every release refers to a defined ticket system.
//! 3. At most one ticket system is the default.
//!
//! All operations return a new document; a failed operation leaves the
//! original untouched.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use super::name::ProjectName;
use super::release::{Change, Release};
use super::ticket_system::TicketSystem;
use super::version::Version;

/// Broad classification of failures, shared by every layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input that violates the document schema or lexical rules
    MalformedInput,
    /// A command whose preconditions are not met
    InvalidMutation,
    /// Filesystem errors
    IoFailure,
    /// A requested release or version is absent
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::MalformedInput => "malformed input",
            ErrorKind::InvalidMutation => "invalid mutation",
            ErrorKind::IoFailure => "I/O failure",
            ErrorKind::NotFound => "not found",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ChangelogError {
    #[error("At most one release may be open at any given time (found {0})")]
    TooManyOpenReleases(usize),

    #[error("Release {version} refers to undefined ticket system '{ticket_system}'")]
    UndefinedTicketSystem {
        version: Version,
        ticket_system: String,
    },

    #[error("At most one ticket system may be declared as being the default")]
    MultipleDefaultTicketSystems,

    #[error("A release with version {0} already exists")]
    ReleaseExists(Version),

    #[error("A release with version {0} is already open")]
    ReleaseAlreadyOpen(Version),

    #[error("Release {0} is not open for modification")]
    ReleaseNotOpen(Version),

    #[error("No release is currently open")]
    NoOpenRelease,

    #[error("No current release exists")]
    NoReleases,

    #[error("Release {0} not found")]
    ReleaseNotFound(Version),

    #[error("No ticket system named '{0}' is defined")]
    UnknownTicketSystem(String),

    #[error("No default ticket system is available")]
    AmbiguousTicketSystem,

    #[error("A ticket system named '{0}' is already defined")]
    DuplicateTicketSystem(String),

    #[error("Invalid ticket system ID '{0}': must be non-empty without whitespace")]
    InvalidTicketSystemId(String),

    #[error("Cannot suggest a version following non-standard version {0}")]
    UnsuggestableVersion(Version),

    #[error("Change summary must not be empty")]
    EmptySummary,
}

impl ChangelogError {
    /// Classifies this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChangelogError::NoReleases | ChangelogError::ReleaseNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::InvalidMutation,
        }
    }
}

/// A project changelog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changelog {
    project: ProjectName,
    releases: BTreeMap<Version, Release>,
    ticket_systems: BTreeMap<String, TicketSystem>,
}

impl Changelog {
    /// Assembles a changelog, checking every invariant
    pub fn new(
        project: ProjectName,
        releases: impl IntoIterator<Item = Release>,
        ticket_systems: impl IntoIterator<Item = TicketSystem>,
    ) -> Result<Self, ChangelogError> {
        let mut release_map = BTreeMap::new();
        for release in releases {
            if release_map.contains_key(&release.version) {
                return Err(ChangelogError::ReleaseExists(release.version));
            }
            release_map.insert(release.version.clone(), release);
        }

        let mut system_map = BTreeMap::new();
        for system in ticket_systems {
            if system_map.contains_key(&system.id) {
                return Err(ChangelogError::DuplicateTicketSystem(system.id));
            }
            system_map.insert(system.id.clone(), system);
        }

        let changelog = Self {
            project,
            releases: release_map,
            ticket_systems: system_map,
        };
        changelog.check_invariants()?;
        Ok(changelog)
    }

    /// Creates an empty changelog whose only ticket system is the default
    pub fn initialize(project: ProjectName, ticket_system: TicketSystem) -> Self {
        let system = ticket_system.with_default(true);
        Self {
            project,
            releases: BTreeMap::new(),
            ticket_systems: BTreeMap::from([(system.id.clone(), system)]),
        }
    }

    fn check_invariants(&self) -> Result<(), ChangelogError> {
        let open = self.releases.values().filter(|r| r.open).count();
        if open > 1 {
            return Err(ChangelogError::TooManyOpenReleases(open));
        }

        for release in self.releases.values() {
            if !self.ticket_systems.contains_key(&release.ticket_system) {
                return Err(ChangelogError::UndefinedTicketSystem {
                    version: release.version.clone(),
                    ticket_system: release.ticket_system.clone(),
                });
            }
        }

        let defaults = self.ticket_systems.values().filter(|s| s.is_default).count();
        if defaults > 1 {
            return Err(ChangelogError::MultipleDefaultTicketSystems);
        }

        Ok(())
    }

    /// Returns the project name
    pub fn project(&self) -> &ProjectName {
        &self.project
    }

    /// Returns all releases keyed by version, ascending
    pub fn releases(&self) -> &BTreeMap<Version, Release> {
        &self.releases
    }

    /// Returns all ticket systems keyed by ID
    pub fn ticket_systems(&self) -> &BTreeMap<String, TicketSystem> {
        &self.ticket_systems
    }

    /// Returns the release with the given version
    pub fn release(&self, version: &Version) -> Option<&Release> {
        self.releases.get(version)
    }

    /// Returns the release versions in ascending order
    pub fn release_versions(&self) -> impl DoubleEndedIterator<Item = &Version> {
        self.releases.keys()
    }

    /// Returns the release with the greatest version
    pub fn latest_release(&self) -> Option<&Release> {
        self.releases.values().next_back()
    }

    /// Returns the single open release, if any
    pub fn open_release(&self) -> Option<&Release> {
        self.releases.values().find(|r| r.open)
    }

    /// Suggests the version of the next release: `1.0.0` for an empty
    /// changelog, otherwise a minor bump of the latest release
    pub fn suggest_next_version(&self) -> Result<Version, ChangelogError> {
        match self.latest_release() {
            None => Ok(Version::new(1, 0, 0)),
            Some(latest) => latest
                .version
                .next_minor()
                .ok_or_else(|| ChangelogError::UnsuggestableVersion(latest.version.clone())),
        }
    }

    /// Resolves the ticket system for a new release
    ///
    /// An explicit ID must exist. Without one, a sole ticket system is used,
    /// then the default.
    pub fn resolve_ticket_system(&self, explicit: Option<&str>) -> Result<&TicketSystem, ChangelogError> {
        if let Some(id) = explicit {
            return self
                .ticket_systems
                .get(id)
                .ok_or_else(|| ChangelogError::UnknownTicketSystem(id.to_string()));
        }

        if self.ticket_systems.len() == 1 {
            if let Some(only) = self.ticket_systems.values().next() {
                return Ok(only);
            }
        }

        self.ticket_systems
            .values()
            .find(|s| s.is_default)
            .ok_or(ChangelogError::AmbiguousTicketSystem)
    }

    /// Resolves the release named by `version`, or the current open release
    /// when no version is given. Returns `None` unless that release is open.
    pub fn find_release_or_latest_open(&self, version: Option<&Version>) -> Option<&Release> {
        match version {
            Some(version) => self.releases.get(version).filter(|r| r.open),
            None => self.open_release(),
        }
    }

    /// Inserts or replaces a release
    pub fn with_release(&self, release: Release) -> Result<Self, ChangelogError> {
        let mut changelog = self.clone();
        changelog.releases.insert(release.version.clone(), release);
        changelog.check_invariants()?;
        Ok(changelog)
    }

    /// Adds a new ticket system
    pub fn with_ticket_system(&self, system: TicketSystem) -> Result<Self, ChangelogError> {
        if self.ticket_systems.contains_key(&system.id) {
            return Err(ChangelogError::DuplicateTicketSystem(system.id));
        }

        let mut changelog = self.clone();
        changelog.ticket_systems.insert(system.id.clone(), system);
        changelog.check_invariants()?;
        Ok(changelog)
    }

    /// Moves the default flag to the named ticket system
    pub fn with_default_ticket_system(&self, id: &str) -> Result<Self, ChangelogError> {
        if !self.ticket_systems.contains_key(id) {
            return Err(ChangelogError::UnknownTicketSystem(id.to_string()));
        }

        let mut changelog = self.clone();
        for system in changelog.ticket_systems.values_mut() {
            system.is_default = system.id == id;
        }
        Ok(changelog)
    }

    /// Begins a new open release
    ///
    /// The version defaults to [`Changelog::suggest_next_version`] and the
    /// ticket system to [`Changelog::resolve_ticket_system`].
    pub fn begin_release(
        &self,
        version: Option<Version>,
        ticket_system: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, ChangelogError> {
        let version = match version {
            Some(version) => version,
            None => self.suggest_next_version()?,
        };
        let system = self.resolve_ticket_system(ticket_system)?;

        if self.releases.contains_key(&version) {
            return Err(ChangelogError::ReleaseExists(version));
        }
        if let Some(open) = self.open_release() {
            return Err(ChangelogError::ReleaseAlreadyOpen(open.version.clone()));
        }

        self.with_release(Release::begin(version, system.id.clone(), now))
    }

    /// Appends a change to the open release
    pub fn add_change(&self, change: Change) -> Result<Self, ChangelogError> {
        let target = self.require_open_target(None)?;
        let date = change.date;
        let release = target.with_change(change, date)?;
        self.with_release(release)
    }

    /// Closes the named release, or the current open release
    pub fn finish_release(&self, version: Option<&Version>, now: DateTime<Utc>) -> Result<Self, ChangelogError> {
        let release = self.require_open_target(version)?.finish(now)?;
        self.with_release(release)
    }

    /// Moves the open release to a new version
    pub fn set_release_version(&self, version: Version, now: DateTime<Utc>) -> Result<Self, ChangelogError> {
        let current = self.require_open_target(None)?;
        if self.releases.contains_key(&version) {
            return Err(ChangelogError::ReleaseExists(version));
        }

        let moved = current.with_version(version, now)?;
        let mut changelog = self.clone();
        changelog.releases.remove(&current.version);
        changelog.releases.insert(moved.version.clone(), moved);
        changelog.check_invariants()?;
        Ok(changelog)
    }

    /// Binds the open release to another defined ticket system
    pub fn retarget_ticket_system(&self, id: &str, now: DateTime<Utc>) -> Result<Self, ChangelogError> {
        let system = self.resolve_ticket_system(Some(id))?;
        let release = self
            .require_open_target(None)?
            .with_ticket_system(system.id.clone(), now)?;
        self.with_release(release)
    }

    /// Re-stamps the date of the latest release, open or closed
    pub fn touch_latest(&self, now: DateTime<Utc>) -> Result<Self, ChangelogError> {
        let latest = self.latest_release().ok_or(ChangelogError::NoReleases)?;
        self.with_release(latest.touched(now))
    }

    fn require_open_target(&self, version: Option<&Version>) -> Result<&Release, ChangelogError> {
        if let Some(release) = self.find_release_or_latest_open(version) {
            return Ok(release);
        }

        match version {
            Some(version) if self.releases.contains_key(version) => {
                Err(ChangelogError::ReleaseNotOpen(version.clone()))
            }
            Some(version) => Err(ChangelogError::ReleaseNotFound(version.clone())),
            None => match self.latest_release() {
                Some(latest) => Err(ChangelogError::ReleaseNotOpen(latest.version.clone())),
                None => Err(ChangelogError::NoOpenRelease),
            },
        }
    }

    /// Keeps only the `count` most recent releases
    pub fn limit(&self, count: usize) -> Self {
        let releases = self
            .releases
            .iter()
            .rev()
            .take(count)
            .map(|(v, r)| (v.clone(), r.clone()))
            .collect();

        Self {
            releases,
            ..self.clone()
        }
    }

    /// Keeps at most `count` releases up to and including `version`, newest
    /// first. Returns `None` if the changelog has no such release.
    pub fn up_to_and_including(&self, version: &Version, count: usize) -> Option<Self> {
        if !self.releases.contains_key(version) {
            return None;
        }

        let releases = self
            .releases
            .range(..=version)
            .rev()
            .take(count)
            .map(|(v, r)| (v.clone(), r.clone()))
            .collect();

        Some(Self {
            releases,
            ..self.clone()
        })
    }
}
