mod cmd;
mod output;
mod root;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cmd::{cohort::CohortSubcommand, config::ConfigSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rota",
    about = "Daily assignment scheduler: rotate cohort members into each day's list",
    version,
    propagate_version = true
)]
struct Cli {
    /// Data root (default: nearest parent containing .rota/, else cwd)
    #[arg(long, global = true, env = "ROTA_ROOT")]
    root: Option<PathBuf>,

    /// Owner whose cohorts and daily lists are used (default: config owner)
    #[arg(long, global = true, env = "ROTA_OWNER")]
    owner: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .rota/ with a config file and an empty store
    Init,

    /// Import, list, and remove cohorts
    Cohort {
        #[command(subcommand)]
        subcommand: CohortSubcommand,
    },

    /// Resolve the daily assignment list
    Today {
        /// Date to resolve (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Discard the stored list and rotate again
        #[arg(long)]
        force: bool,
    },

    /// Show what a recomputation would select, without saving anything
    Preview {
        /// Date to preview (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List stored daily assignment records
    History,

    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let owner = cli.owner.as_deref();

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, owner),
        Commands::Cohort { subcommand } => cmd::cohort::run(&root, owner, subcommand, cli.json),
        Commands::Today { date, force } => cmd::today::run(&root, owner, date, force, cli.json),
        Commands::Preview { date } => cmd::preview::run(&root, owner, date, cli.json),
        Commands::History => cmd::history::run(&root, owner, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, owner, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
