use super::Session;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use rota_core::{
    cohort::{validate_cohorts, CohortReader},
    config::{Config, WarnLevel},
};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the loaded configuration
    Show,

    /// Validate the config and the owner's cohorts for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(
    root: &Path,
    owner: Option<&str>,
    subcmd: ConfigSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, owner, json),
    }
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    if json {
        return print_json(&config);
    }
    println!("owner:       {}", config.owner);
    println!("store:       {}", config.db_path(root).display());
    let mode = serde_json::to_value(config.store.concurrency)?;
    println!("concurrency: {}", mode.as_str().unwrap_or("unknown"));
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, owner: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let mut warnings = config.validate();

    // Cohorts can only be checked once the store opens for a valid owner.
    if warnings.iter().all(|w| w.level != WarnLevel::Error) {
        let session = Session::open(root, owner)?;
        let cohorts = session
            .store
            .list_cohorts(&session.owner)
            .context("failed to list cohorts")?;
        warnings.extend(validate_cohorts(&cohorts));
    }

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
