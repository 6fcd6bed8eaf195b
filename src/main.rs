//! # Organization Registry CLI (`oreg`)
//!
//! The `oreg` binary builds and queries a local registry of organizations and
//! their office bearers.
//!
//! ## Usage
//!
//! ```bash
//! oreg --config ./config/oreg.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `oreg init` | Create the SQLite database and run schema migrations |
//! | `oreg import <dir>` | Ingest a directory of JSON source records |
//! | `oreg search orgs [TEXT]` | Filter organizations by text, group and date |
//! | `oreg search directors <TEXT>` | Find directors by name, country or address |
//! | `oreg get <id>` | Show one organization and its office bearers |
//! | `oreg stats` | Entity counts and per-group breakdown |
//! | `oreg verify` | Check the search index against the entity tables |
//!
//! ## Examples
//!
//! ```bash
//! oreg init
//! oreg import ./data/records
//! oreg search orgs bank --category domestic --status live
//! oreg search orgs --unclassified-status --from 01/01/2000 --to 31/12/2009
//! oreg search directors "not like mauritius" --column country
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use org_registry::config;
use org_registry::filter::{
    BearerColumn, BearerCriteria, DateBound, DateRange, GroupSelection, OrganizationCriteria,
};
use org_registry::get;
use org_registry::ingest::{self, ImportOptions};
use org_registry::migrate;
use org_registry::progress::ProgressMode;
use org_registry::search;
use org_registry::stats;
use org_registry::vocab::{Category, Nature, Status};

/// Organization Registry CLI: ingest organization records and search them.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/oreg.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "oreg",
    about = "Organization Registry: ingest organization records and search them",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/oreg.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// This command is idempotent; running it multiple times is safe.
    Init,

    /// Import a directory of JSON source records.
    ///
    /// Records whose registration or file number is already stored are
    /// skipped unless `--force` is given.
    Import {
        /// Directory to scan.
        dir: PathBuf,

        /// Overwrite stored organizations whose source record changed.
        #[arg(long)]
        force: bool,

        /// Parse and normalize only; write nothing.
        #[arg(long)]
        dry_run: bool,

        /// Import at most N files (in path order).
        #[arg(long)]
        limit: Option<usize>,

        /// Progress on stderr: off, human, or json. Defaults to human on a TTY.
        #[arg(long)]
        progress: Option<String>,
    },

    /// Search the registry.
    Search {
        #[command(subcommand)]
        target: SearchTarget,
    },

    /// Show one organization with all of its office bearers.
    Get {
        id: i64,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show entity counts and per-group breakdown.
    Stats,

    /// Check that the search index mirrors the stored entities.
    Verify,
}

#[derive(Subcommand)]
enum SearchTarget {
    /// Organizations by name, category, status, nature and incorporation date.
    Orgs(OrgSearchArgs),

    /// Directors by name, country or address.
    ///
    /// Prefix the text with `not like ` to exclude matches instead.
    Directors {
        text: String,

        /// Column to match: name, country, or address.
        #[arg(long, default_value = "name")]
        column: BearerColumn,

        #[arg(long)]
        limit: Option<i64>,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct OrgSearchArgs {
    /// Fragment of the current or former name.
    text: Option<String>,

    /// Category (repeatable): domestic, global-business, authorised, foreign.
    #[arg(long)]
    category: Vec<String>,

    /// Also match organizations outside every known category.
    #[arg(long)]
    unclassified_category: bool,

    /// Status (repeatable): live, defunct, dissolved.
    #[arg(long)]
    status: Vec<String>,

    #[arg(long)]
    unclassified_status: bool,

    /// Nature (repeatable): private, public.
    #[arg(long)]
    nature: Vec<String>,

    #[arg(long)]
    unclassified_nature: bool,

    /// Incorporated on or after (DD/MM/YYYY or YYYY-MM-DD).
    #[arg(long)]
    from: Option<DateBound>,

    /// Incorporated on or before (DD/MM/YYYY or YYYY-MM-DD).
    #[arg(long)]
    to: Option<DateBound>,

    #[arg(long)]
    limit: Option<i64>,

    #[arg(long)]
    json: bool,
}

impl OrgSearchArgs {
    fn criteria(&self) -> anyhow::Result<OrganizationCriteria> {
        Ok(OrganizationCriteria {
            text: self.text.clone(),
            category: GroupSelection::of(search::parse_labels::<Category>(&self.category)?)
                .with_unclassified(self.unclassified_category),
            status: GroupSelection::of(search::parse_labels::<Status>(&self.status)?)
                .with_unclassified(self.unclassified_status),
            nature: GroupSelection::of(search::parse_labels::<Nature>(&self.nature)?)
                .with_unclassified(self.unclassified_nature),
            incorporated: DateRange {
                from: self.from.clone(),
                to: self.to.clone(),
            },
        })
    }
}

fn parse_progress(value: Option<&str>) -> anyhow::Result<ProgressMode> {
    match value {
        None => Ok(ProgressMode::default_for_tty()),
        Some("off") => Ok(ProgressMode::Off),
        Some("human") => Ok(ProgressMode::Human),
        Some("json") => Ok(ProgressMode::Json),
        Some(other) => anyhow::bail!(
            "unknown progress mode '{}': use off, human, or json",
            other
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import {
            dir,
            force,
            dry_run,
            limit,
            progress,
        } => {
            let options = ImportOptions {
                force,
                dry_run,
                limit,
                progress: parse_progress(progress.as_deref())?,
            };
            ingest::run_import(&cfg, &dir, &options).await?;
        }
        Commands::Search { target } => match target {
            SearchTarget::Orgs(args) => {
                let criteria = args.criteria()?;
                search::run_search_organizations(&cfg, &criteria, args.limit, args.json).await?;
            }
            SearchTarget::Directors {
                text,
                column,
                limit,
                json,
            } => {
                let criteria = BearerCriteria::new(column, &text);
                search::run_search_directors(&cfg, &criteria, limit, json).await?;
            }
        },
        Commands::Get { id, json } => {
            get::run_get(&cfg, id, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Verify => {
            stats::run_verify(&cfg).await?;
        }
    }

    Ok(())
}
