use super::{join_ids, Session};
use crate::output::{print_json, print_table};
use anyhow::Context;
use rota_core::store::AssignmentStore;
use std::path::Path;

pub fn run(root: &Path, owner: Option<&str>, json: bool) -> anyhow::Result<()> {
    let session = Session::open(root, owner)?;
    let records = session
        .store
        .list_records(&session.owner)
        .context("failed to list daily records")?;

    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("No daily lists stored for '{}'.", session.owner);
        return Ok(());
    }

    let rows = records
        .iter()
        .map(|r| {
            vec![
                r.date.to_string(),
                r.selected_subject_ids.len().to_string(),
                join_ids(&r.selected_subject_ids),
                r.settings_fingerprint.to_string(),
                r.computed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]
        })
        .collect();
    print_table(&["DATE", "COUNT", "SUBJECTS", "FINGERPRINT", "COMPUTED (UTC)"], rows);
    Ok(())
}
