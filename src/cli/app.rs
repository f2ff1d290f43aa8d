//! Main CLI application structure

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use url::Url;

use super::output::{Output, OutputFormat};
use super::session::Session;
use super::write::{FeedArgs, Selection};
use super::{change, initialize, release, ticket_system, write};
use crate::domain::{ModuleName, ProjectName, TicketId, Version};
use crate::storage::Config;

/// Environment variable holding a `tracing` filter directive
pub const LOG_ENV: &str = "CHANGELOG_LOG";

#[derive(Parser)]
#[command(name = "changelog")]
#[command(author, version, about = "Maintain a structured project changelog")]
pub struct Cli {
    /// Changelog file (defaults to the configured file, then README-CHANGES.xml)
    #[arg(long, global = true, env = "CHANGELOG_FILE")]
    pub file: Option<PathBuf>,

    /// Output format (defaults to the configured format, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new changelog; fails if the file exists
    Initialize {
        /// Project name (lower-case dotted, e.g. com.example.widgets)
        #[arg(long)]
        project: ProjectName,

        /// ID of the project's ticket system
        #[arg(long)]
        ticket_system_name: String,

        /// Base URI that ticket IDs are appended to
        #[arg(long)]
        ticket_system_uri: Url,
    },

    /// Begin a new open release
    ReleaseBegin {
        /// Release version (defaults to a minor bump of the latest release)
        #[arg(long)]
        version: Option<Version>,

        /// Ticket system for the release (defaults to the sole or default system)
        #[arg(long)]
        ticket_system: Option<String>,
    },

    /// Close the open release
    ReleaseFinish {
        /// Release to close (defaults to the open release)
        #[arg(long)]
        version: Option<Version>,
    },

    /// Change the version of the open release
    ReleaseSetVersion {
        /// New version
        #[arg(long)]
        version: Version,
    },

    /// Show the latest release and whether it is open
    ReleaseCurrent,

    /// Re-stamp the date of the latest release
    ReleaseTouch,

    /// Bind the open release to another ticket system
    ReleaseSetTicketSystem {
        /// Ticket system ID
        #[arg(long)]
        ticket_system: String,
    },

    /// Append a change to the open release
    ChangeAdd {
        /// Summary of the change
        #[arg(long)]
        summary: String,

        /// Affected module
        #[arg(long)]
        module: Option<ModuleName>,

        /// Related ticket (repeatable)
        #[arg(long = "ticket")]
        tickets: Vec<TicketId>,

        /// Mark the change as backwards incompatible
        #[arg(long)]
        incompatible: bool,
    },

    /// Add a ticket system
    TicketSystemAdd {
        /// Ticket system ID
        #[arg(long)]
        id: String,

        /// Base URI that ticket IDs are appended to
        #[arg(long)]
        uri: Url,

        /// Make this the default ticket system
        #[arg(long)]
        default: bool,
    },

    /// Make a ticket system the default
    TicketSystemSetDefault {
        /// Ticket system ID
        #[arg(long)]
        id: String,
    },

    /// Write an Atom feed of releases to stdout
    WriteAtom {
        /// Newest release to include
        #[arg(long)]
        version: Option<Version>,

        /// Maximum number of releases
        #[arg(long)]
        count: Option<usize>,

        /// Feed title
        #[arg(long)]
        title: Option<String>,

        /// Feed ID
        #[arg(long)]
        uri: Option<String>,

        /// Feed author name
        #[arg(long)]
        author_name: Option<String>,

        /// Feed author email
        #[arg(long)]
        author_email: Option<String>,
    },

    /// Write the changelog as plain text to stdout
    WritePlain {
        /// Newest release to include
        #[arg(long)]
        version: Option<Version>,

        /// Maximum number of releases
        #[arg(long)]
        count: Option<usize>,

        /// Prefix lines with dates
        #[arg(long)]
        show_dates: bool,
    },

    /// Write the changelog as an XHTML table to stdout
    WriteXhtml {
        /// Newest release to include
        #[arg(long)]
        version: Option<Version>,

        /// Maximum number of releases
        #[arg(long)]
        count: Option<usize>,
    },
}

/// Installs the stderr log subscriber
///
/// `CHANGELOG_LOG` wins; otherwise `--verbose` selects `debug` and the
/// default is `warn`.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load()?;
    let output = Output::new(cli.format.unwrap_or_else(|| config.output_format()));
    let session = Session::new(config, cli.file);

    match cli.command {
        Commands::Initialize {
            project,
            ticket_system_name,
            ticket_system_uri,
        } => initialize::run(&session, &output, project, &ticket_system_name, ticket_system_uri)?,

        Commands::ReleaseBegin { version, ticket_system } => {
            release::begin(&session, &output, version, ticket_system.as_deref())?
        }
        Commands::ReleaseFinish { version } => release::finish(&session, &output, version)?,
        Commands::ReleaseSetVersion { version } => release::set_version(&session, &output, version)?,
        Commands::ReleaseCurrent => release::current(&session, &output)?,
        Commands::ReleaseTouch => release::touch(&session, &output)?,
        Commands::ReleaseSetTicketSystem { ticket_system } => {
            release::set_ticket_system(&session, &output, &ticket_system)?
        }

        Commands::ChangeAdd {
            summary,
            module,
            tickets,
            incompatible,
        } => change::add(&session, &output, &summary, module, tickets, incompatible)?,

        Commands::TicketSystemAdd { id, uri, default } => {
            ticket_system::add(&session, &output, &id, uri, default)?
        }
        Commands::TicketSystemSetDefault { id } => ticket_system::set_default(&session, &output, &id)?,

        Commands::WriteAtom {
            version,
            count,
            title,
            uri,
            author_name,
            author_email,
        } => write::atom(
            &session,
            Selection { version, count },
            FeedArgs {
                title,
                uri,
                author_name,
                author_email,
            },
        )?,
        Commands::WritePlain {
            version,
            count,
            show_dates,
        } => write::plain(&session, Selection { version, count }, show_dates)?,
        Commands::WriteXhtml { version, count } => write::xhtml(&session, Selection { version, count })?,
    }

    Ok(())
}
