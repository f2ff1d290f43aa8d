//! Validated names used throughout a changelog
//!
//! Name Format:
//! - Project and module names: dot-separated segments, each a lower-case
//!   letter followed by lower-case letters, digits or `_` (e.g. `com.example.core`)
//! - Ticket IDs: ASCII letters, digits and `-` (e.g. `SIMPLY-1870`, `42`)
//!
//! Both are limited to [`MAX_NAME_LENGTH`] characters. Violations are rejected
//! when the value is constructed.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// The maximum length of any validated name
pub const MAX_NAME_LENGTH: usize = 128;

#[derive(Debug, Error, PartialEq)]
pub enum NameError {
    #[error("Invalid project name '{0}': expected lower-case dotted segments of at most 128 characters")]
    InvalidProjectName(String),

    #[error("Invalid module name '{0}': expected lower-case dotted segments of at most 128 characters")]
    InvalidModuleName(String),

    #[error("Invalid ticket ID '{0}': expected letters, digits or '-' (at most 128 characters)")]
    InvalidTicketId(String),
}

/// Dotted name segments: a lower-case letter (`Ll`), then lower-case
/// letters, decimal digits (`Nd`) or `_`
static DOTTED_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn dotted_name_regex() -> &'static Regex {
    DOTTED_NAME_REGEX.get_or_init(|| {
        Regex::new(r"^\p{Ll}[\p{Ll}\p{Nd}_]*(\.\p{Ll}[\p{Ll}\p{Nd}_]*)*$")
            .expect("Dotted name regex should compile")
    })
}

fn is_dotted_name(s: &str) -> bool {
    s.chars().count() <= MAX_NAME_LENGTH && dotted_name_regex().is_match(s)
}

fn is_ticket_token(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_NAME_LENGTH
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

macro_rules! validated_name {
    ($(#[$meta:meta])* $name:ident, $check:ident, $error:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validates and wraps the given value
            pub fn new(value: impl Into<String>) -> Result<Self, NameError> {
                let value = value.into();
                if $check(&value) {
                    Ok(Self(value))
                } else {
                    Err(NameError::$error(value))
                }
            }

            /// Returns the underlying string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = NameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = NameError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(name: $name) -> Self {
                name.0
            }
        }
    };
}

validated_name!(
    /// The name of the project a changelog describes
    ProjectName,
    is_dotted_name,
    InvalidProjectName
);

validated_name!(
    /// The name of the module a change affects
    ModuleName,
    is_dotted_name,
    InvalidModuleName
);

validated_name!(
    /// A reference to a ticket in a release's ticket system
    TicketId,
    is_ticket_token,
    InvalidTicketId
);
