use super::{join_ids, Session};
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use rota_core::{
    cohort::{validate_cohorts, Cohort, CohortReader},
    config::WarnLevel,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum CohortSubcommand {
    /// Insert or replace cohorts from a YAML file (`cohorts: [...]`)
    Import {
        file: PathBuf,
        /// Start every imported cohort's rotation from the beginning
        #[arg(long)]
        reset_cursor: bool,
    },
    /// List cohorts with quota, active days, size, and cursor
    List,
    /// Remove a cohort
    Remove { id: String },
}

#[derive(Deserialize)]
struct CohortFile {
    cohorts: Vec<Cohort>,
}

pub fn run(
    root: &Path,
    owner: Option<&str>,
    subcmd: CohortSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let session = Session::open(root, owner)?;
    match subcmd {
        CohortSubcommand::Import { file, reset_cursor } => {
            import(&session, &file, reset_cursor, json)
        }
        CohortSubcommand::List => list(&session, json),
        CohortSubcommand::Remove { id } => remove(&session, &id, json),
    }
}

fn import(session: &Session, file: &Path, reset_cursor: bool, json: bool) -> anyhow::Result<()> {
    let data = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let parsed: CohortFile = serde_yaml::from_str(&data)
        .with_context(|| format!("failed to parse {}", file.display()))?;

    let warnings = validate_cohorts(&parsed.cohorts);
    for w in &warnings {
        let prefix = match w.level {
            WarnLevel::Warning => "warning",
            WarnLevel::Error => "error",
        };
        eprintln!("[{prefix}] {}", w.message);
    }
    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("cohort file has errors; nothing imported");
    }

    let summary = session
        .store
        .upsert_cohorts(&session.owner, &parsed.cohorts, !reset_cursor)
        .context("failed to import cohorts")?;

    if json {
        print_json(&summary)?;
    } else {
        println!(
            "Imported {} cohort(s) for '{}': {} created, {} updated",
            parsed.cohorts.len(),
            session.owner,
            summary.created,
            summary.updated
        );
    }
    Ok(())
}

fn list(session: &Session, json: bool) -> anyhow::Result<()> {
    let cohorts = session
        .store
        .list_cohorts(&session.owner)
        .context("failed to list cohorts")?;

    if json {
        return print_json(&cohorts);
    }
    if cohorts.is_empty() {
        println!("No cohorts for '{}'.", session.owner);
        return Ok(());
    }

    let rows = cohorts
        .iter()
        .map(|c| {
            vec![
                c.id.clone(),
                c.quota.to_string(),
                format_days(c),
                c.member_ids.len().to_string(),
                c.rotation_cursor.to_string(),
                join_ids(&c.member_ids),
            ]
        })
        .collect();
    print_table(&["COHORT", "QUOTA", "DAYS", "SIZE", "CURSOR", "MEMBERS"], rows);
    Ok(())
}

fn remove(session: &Session, id: &str, json: bool) -> anyhow::Result<()> {
    session
        .store
        .remove_cohort(&session.owner, id)
        .with_context(|| format!("failed to remove cohort '{id}'"))?;
    if json {
        print_json(&serde_json::json!({ "removed": id }))?;
    } else {
        println!("Removed cohort '{id}'");
    }
    Ok(())
}

fn format_days(cohort: &Cohort) -> String {
    const NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    if cohort.active_days.is_empty() {
        return "-".to_string();
    }
    cohort
        .active_days
        .iter()
        .map(|&d| NAMES.get(d as usize).copied().unwrap_or("?"))
        .collect::<Vec<_>>()
        .join(",")
}
