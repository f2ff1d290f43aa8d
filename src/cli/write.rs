//! Rendering commands
//!
//! All renderers write to stdout regardless of `--format`.

use std::io::{self, Write};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;

use super::session::Session;
use crate::domain::{Changelog, ChangelogError, Version};
use crate::render::{AtomFeed, AtomRenderer, PlainRenderer, Renderer, XhtmlRenderer};

/// Options shared by every rendering command
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Newest release to include
    pub version: Option<Version>,
    /// Maximum number of releases
    pub count: Option<usize>,
}

impl Selection {
    /// Narrows `changelog` to the selected releases
    pub fn apply(&self, changelog: &Changelog) -> Result<Changelog, ChangelogError> {
        match (&self.version, self.count) {
            (Some(version), count) => changelog
                .up_to_and_including(version, count.unwrap_or(usize::MAX))
                .ok_or_else(|| ChangelogError::ReleaseNotFound(version.clone())),
            (None, Some(count)) => Ok(changelog.limit(count)),
            (None, None) => Ok(changelog.clone()),
        }
    }
}

/// Feed metadata given on the command line
#[derive(Debug, Clone, Default)]
pub struct FeedArgs {
    pub title: Option<String>,
    pub uri: Option<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

fn render(renderer: &dyn Renderer, changelog: &Changelog) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    renderer.render(changelog, &mut out).context("Failed to render changelog")?;
    out.flush()?;
    Ok(())
}

pub fn plain(session: &Session, selection: Selection, show_dates: bool) -> Result<()> {
    let changelog = session.load()?;

    let selection = Selection {
        count: selection.count.or(session.config.plain.count),
        ..selection
    };
    let show_dates = show_dates || session.config.plain.show_dates.unwrap_or(false);

    render(&PlainRenderer::new(show_dates), &selection.apply(&changelog)?)
}

pub fn atom(session: &Session, selection: Selection, args: FeedArgs) -> Result<()> {
    let changelog = session.load()?;
    let config = &session.config.atom;

    let missing = |flag: &str, key: &str| {
        anyhow!("No feed {} given (use --{} or set [atom] {} in configuration)", key.replace('_', " "), flag, key)
    };
    let feed = AtomFeed {
        title: args
            .title
            .or_else(|| config.title.clone())
            .unwrap_or_else(|| format!("{} releases", changelog.project())),
        uri: args
            .uri
            .or_else(|| config.uri.clone())
            .ok_or_else(|| missing("uri", "uri"))?,
        author_name: args
            .author_name
            .or_else(|| config.author_name.clone())
            .ok_or_else(|| missing("author-name", "author_name"))?,
        author_email: args
            .author_email
            .or_else(|| config.author_email.clone())
            .ok_or_else(|| missing("author-email", "author_email"))?,
    };

    let renderer = AtomRenderer::new(feed, Utc::now());
    render(&renderer, &selection.apply(&changelog)?)
}

pub fn xhtml(session: &Session, selection: Selection) -> Result<()> {
    let changelog = session.load()?;
    render(&XhtmlRenderer::new(), &selection.apply(&changelog)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProjectName, Release, TicketSystem};
    use chrono::TimeZone;
    use url::Url;

    fn changelog() -> Changelog {
        let system = TicketSystem::new("gh", Url::parse("https://example.com/").unwrap(), true).unwrap();
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let releases = (1..=4).map(|minor| {
            Release::begin(Version::new(1, minor, 0), "gh", date)
                .finish(date)
                .unwrap()
        });
        Changelog::new(ProjectName::new("com.example").unwrap(), releases, vec![system]).unwrap()
    }

    fn versions(changelog: &Changelog) -> Vec<String> {
        changelog.release_versions().map(ToString::to_string).collect()
    }

    #[test]
    fn no_selection_keeps_everything() {
        let selected = Selection::default().apply(&changelog()).unwrap();
        assert_eq!(selected.releases().len(), 4);
    }

    #[test]
    fn count_keeps_newest() {
        let selection = Selection {
            version: None,
            count: Some(2),
        };
        let selected = selection.apply(&changelog()).unwrap();
        assert_eq!(versions(&selected), vec!["1.3.0", "1.4.0"]);
    }

    #[test]
    fn version_bounds_selection() {
        let selection = Selection {
            version: Some(Version::new(1, 3, 0)),
            count: Some(2),
        };
        let selected = selection.apply(&changelog()).unwrap();
        assert_eq!(versions(&selected), vec!["1.2.0", "1.3.0"]);

        let missing = Selection {
            version: Some(Version::new(9, 0, 0)),
            count: None,
        };
        assert!(missing.apply(&changelog()).is_err());
    }
}
