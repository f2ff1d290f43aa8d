//! Ticket systems referenced by releases

use serde::{Deserialize, Serialize};
use url::Url;

use super::changelog::ChangelogError;

/// An external issue tracker that releases refer to by ID
///
/// Ticket links are formed by appending a ticket ID to `uri`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSystem {
    /// Unique identifier within a changelog
    pub id: String,

    /// Base URI for ticket links
    pub uri: Url,

    /// Whether this is the default system for new releases
    #[serde(default)]
    pub is_default: bool,
}

impl TicketSystem {
    /// Creates a ticket system, rejecting empty IDs or IDs containing whitespace
    pub fn new(id: impl Into<String>, uri: Url, is_default: bool) -> Result<Self, ChangelogError> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(ChangelogError::InvalidTicketSystemId(id));
        }

        Ok(Self { id, uri, is_default })
    }

    /// Returns a copy with the default flag set to `is_default`
    pub fn with_default(&self, is_default: bool) -> Self {
        Self {
            is_default,
            ..self.clone()
        }
    }

    /// Returns the link for a ticket in this system
    pub fn ticket_link(&self, ticket: &str) -> String {
        format!("{}{}", self.uri, ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn github() -> Url {
        Url::parse("https://github.com/example/project/issues/").unwrap()
    }

    #[test]
    fn rejects_bad_ids() {
        assert!(TicketSystem::new("", github(), false).is_err());
        assert!(TicketSystem::new("git hub", github(), false).is_err());
        assert!(TicketSystem::new("com.github", github(), false).is_ok());
    }

    #[test]
    fn ticket_links_append_id() {
        let system = TicketSystem::new("github", github(), true).unwrap();
        assert_eq!(
            system.ticket_link("42"),
            "https://github.com/example/project/issues/42"
        );
    }

    #[test]
    fn with_default_only_touches_flag() {
        let system = TicketSystem::new("github", github(), true).unwrap();
        let moved = system.with_default(false);

        assert!(!moved.is_default);
        assert_eq!(moved.id, system.id);
        assert_eq!(moved.uri, system.uri);
    }
}
