//! Release versions
//!
//! Version Format:
//! - Standard: `{major}.{minor}.{patch}` or `{major}.{minor}.{patch}-{qualifier}`
//! - Text: anything else, kept verbatim
//!
//! Parsing never fails: input that does not match the standard shape is kept
//! as a [`Version::Text`] value.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A release version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Version {
    /// A `major.minor.patch[-qualifier]` version
    Standard {
        major: u64,
        minor: u64,
        patch: u64,
        /// Empty when the version has no qualifier
        qualifier: String,
    },
    /// A version string that does not follow the standard shape
    Text(TextVersion),
}

/// Version text that does not parse as a standard version
///
/// Only built by [`Version::parse`], so the text never has the standard shape
/// and each display form maps to exactly one [`Version`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextVersion(String);

impl TextVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Version {
    /// Creates a standard version without a qualifier
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version::Standard {
            major,
            minor,
            patch,
            qualifier: String::new(),
        }
    }

    /// Creates a standard version with a qualifier (e.g. `rc1`)
    pub fn with_qualifier(major: u64, minor: u64, patch: u64, qualifier: impl Into<String>) -> Self {
        Version::Standard {
            major,
            minor,
            patch,
            qualifier: qualifier.into(),
        }
    }

    /// Creates a version from free-form text
    ///
    /// Standard-shaped text still yields [`Version::Standard`].
    pub fn text(raw: impl Into<String>) -> Self {
        Version::parse(&raw.into())
    }

    /// Parses a version string, falling back to [`Version::Text`]
    pub fn parse(text: &str) -> Self {
        parse_standard(text).unwrap_or_else(|| Version::Text(TextVersion(text.to_string())))
    }

    /// Returns true for `major.minor.patch` shaped versions
    pub fn is_standard(&self) -> bool {
        matches!(self, Version::Standard { .. })
    }

    /// Returns the qualifier, if this is a standard version with one
    pub fn qualifier(&self) -> Option<&str> {
        match self {
            Version::Standard { qualifier, .. } if !qualifier.is_empty() => Some(qualifier),
            _ => None,
        }
    }

    /// Returns `major.(minor + 1).0`, dropping any qualifier
    ///
    /// Text versions have no successor.
    pub fn next_minor(&self) -> Option<Version> {
        match self {
            Version::Standard { major, minor, .. } => {
                Some(Version::new(*major, minor.checked_add(1)?, 0))
            }
            Version::Text(_) => None,
        }
    }
}

/// Attempts the `M.N.P[-qualifier]` grammar
fn parse_standard(text: &str) -> Option<Version> {
    let (major, rest) = text.split_once('.')?;
    let (minor, rest) = rest.split_once('.')?;

    let (patch, qualifier) = if is_number(rest) {
        (rest, "")
    } else {
        let (patch, qualifier) = rest.split_once('-')?;
        // "1.0.0-" would print back as "1.0.0"
        if qualifier.is_empty() {
            return None;
        }
        (patch, qualifier)
    };

    Some(Version::Standard {
        major: number(major)?,
        minor: number(minor)?,
        patch: number(patch)?,
        qualifier: qualifier.to_string(),
    })
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn number(s: &str) -> Option<u64> {
    if is_number(s) {
        s.parse().ok()
    } else {
        None
    }
}

/// Empty qualifiers sort after non-empty ones: `1.0.0-rc1 < 1.0.0`
fn compare_qualifiers(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a.cmp(b),
    }
}

/// Where a text version sits relative to the block of standard versions.
///
/// Every standard version prints with a leading digit, so a text version
/// whose first character sorts below `'0'` also sorts below all of them as a
/// string; all other text versions follow the standard block.
fn text_precedes_standard(raw: &str) -> bool {
    raw.chars().next().map_or(true, |c| c < '0')
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (
                Version::Standard {
                    major: a_major,
                    minor: a_minor,
                    patch: a_patch,
                    qualifier: a_qualifier,
                },
                Version::Standard {
                    major: b_major,
                    minor: b_minor,
                    patch: b_patch,
                    qualifier: b_qualifier,
                },
            ) => (a_major, a_minor, a_patch)
                .cmp(&(b_major, b_minor, b_patch))
                .then_with(|| compare_qualifiers(a_qualifier, b_qualifier)),
            (Version::Text(a), Version::Text(b)) => a.cmp(b),
            (Version::Text(a), Version::Standard { .. }) => {
                if text_precedes_standard(a.as_str()) {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (Version::Standard { .. }, Version::Text(_)) => other.cmp(self).reverse(),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Standard {
                major,
                minor,
                patch,
                qualifier,
            } => {
                write!(f, "{}.{}.{}", major, minor, patch)?;
                if !qualifier.is_empty() {
                    write!(f, "-{}", qualifier)?;
                }
                Ok(())
            }
            Version::Text(raw) => f.write_str(raw.as_str()),
        }
    }
}

impl FromStr for Version {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Version::parse(s))
    }
}

impl From<String> for Version {
    fn from(value: String) -> Self {
        Version::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_triple() {
        assert_eq!(Version::parse("1.2.3"), Version::new(1, 2, 3));
    }

    #[test]
    fn parses_qualifier() {
        let v = Version::parse("1.0.0-rc1");
        assert_eq!(v, Version::with_qualifier(1, 0, 0, "rc1"));
        assert_eq!(v.qualifier(), Some("rc1"));
    }

    #[test]
    fn qualifier_may_contain_separators() {
        let v = Version::parse("2.0.0-beta.2-x");
        assert_eq!(v, Version::with_qualifier(2, 0, 0, "beta.2-x"));
    }

    #[test]
    fn falls_back_to_text() {
        for raw in ["1", "1.0", "a.b.c", "1.x.0", "1.0.x", "1.0.0-", "-1.0.0", "", "1..0"] {
            let version = Version::parse(raw);
            assert!(!version.is_standard(), "input: {:?}", raw);
            assert_eq!(version.to_string(), raw);
        }
    }

    #[test]
    fn oversized_numbers_fall_back_to_text() {
        let raw = "99999999999999999999999.0.0";
        assert!(!Version::parse(raw).is_standard());
    }

    #[test]
    fn standard_shaped_text_is_standard() {
        assert_eq!(Version::text("1.0.0"), Version::new(1, 0, 0));
        assert_eq!(Version::text("2.1.0-rc1"), Version::with_qualifier(2, 1, 0, "rc1"));

        let mut keys = std::collections::BTreeSet::new();
        keys.insert(Version::new(1, 0, 0));
        keys.insert(Version::text("1.0.0"));
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn display_matches_canonical_form() {
        assert_eq!(Version::new(1, 0, 0).to_string(), "1.0.0");
        assert_eq!(Version::with_qualifier(1, 0, 0, "rc1").to_string(), "1.0.0-rc1");
        assert_eq!(Version::text("trunk").to_string(), "trunk");
    }

    #[test]
    fn empty_qualifier_sorts_last() {
        assert!(Version::new(1, 0, 0) > Version::with_qualifier(1, 0, 0, "rc1"));
        assert!(Version::with_qualifier(1, 0, 0, "a") < Version::with_qualifier(1, 0, 0, "b"));
    }

    #[test]
    fn numeric_components_compare_numerically() {
        assert!(Version::new(1, 9, 0) < Version::new(1, 10, 0));
        assert!(Version::new(2, 0, 0) > Version::new(1, 99, 99));
        assert!(Version::with_qualifier(1, 0, 1, "rc1") > Version::new(1, 0, 0));
    }

    #[test]
    fn text_versions_compare_as_strings() {
        assert!(Version::text("alpha") < Version::text("beta"));
        assert!(Version::text("trunk") > Version::new(9, 9, 9));
        assert!(Version::text("+nightly") < Version::new(0, 0, 0));
    }

    #[test]
    fn next_minor_drops_patch_and_qualifier() {
        assert_eq!(
            Version::with_qualifier(1, 4, 7, "rc2").next_minor(),
            Some(Version::new(1, 5, 0))
        );
        assert_eq!(Version::text("trunk").next_minor(), None);
    }

    #[test]
    fn serde_roundtrip() {
        let original = Version::with_qualifier(3, 1, 4, "beta");
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(json, "\"3.1.4-beta\"");

        let parsed: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }
}
