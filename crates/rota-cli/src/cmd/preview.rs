use super::{date_or_today, join_ids, Session};
use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::NaiveDate;
use rota_core::{
    cohort::CohortReader, fingerprint::SettingsFingerprint, rotation::compute_rotation,
    store::AssignmentStore,
};
use std::path::Path;

pub fn run(
    root: &Path,
    owner: Option<&str>,
    date: Option<NaiveDate>,
    json: bool,
) -> anyhow::Result<()> {
    let session = Session::open(root, owner)?;
    let date = date_or_today(date);

    let cohorts = session
        .store
        .list_cohorts(&session.owner)
        .context("failed to list cohorts")?;
    let rotation = compute_rotation(date, &cohorts);
    let fingerprint = SettingsFingerprint::compute(date, &cohorts);
    let stored = session
        .store
        .get(&session.owner, date)
        .context("failed to read stored list")?;

    // What `rota today` would do without --force.
    let stored_state = match &stored {
        None => "none",
        Some(r) if r.settings_fingerprint == fingerprint => "current",
        Some(_) => "stale",
    };

    if json {
        return print_json(&serde_json::json!({
            "date": date,
            "fingerprint": fingerprint,
            "selected_subject_ids": rotation.selected_subject_ids,
            "cohorts": rotation.cohorts,
            "cursor_updates": rotation.cursor_updates,
            "stored": stored_state,
        }));
    }

    println!("Preview for {date} (nothing is saved)");
    if rotation.cohorts.is_empty() {
        println!("  No cohort is active with members on this day.");
    } else {
        let rows = rotation
            .cohorts
            .iter()
            .map(|sel| {
                let cursor = match rotation.cursor_updates.get(&sel.cohort_id) {
                    Some(u) => format!("{} -> {}", u.from, u.to),
                    None => "unchanged".to_string(),
                };
                vec![
                    sel.cohort_id.clone(),
                    sel.effective_quota.to_string(),
                    join_ids(&sel.selected),
                    cursor,
                ]
            })
            .collect();
        print_table(&["COHORT", "TAKES", "SELECTED", "CURSOR"], rows);
    }
    println!("\nFingerprint: {fingerprint}");
    println!("Stored list: {stored_state}");
    Ok(())
}
