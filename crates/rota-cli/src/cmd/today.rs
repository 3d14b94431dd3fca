use super::{date_or_today, Session};
use crate::output::print_json;
use chrono::NaiveDate;
use rota_core::{cache::MemoryCache, Reconciler};
use std::path::Path;

pub fn run(
    root: &Path,
    owner: Option<&str>,
    date: Option<NaiveDate>,
    force: bool,
    json: bool,
) -> anyhow::Result<()> {
    let session = Session::open(root, owner)?;
    let date = date_or_today(date);

    // Each invocation is its own session, so the cache starts empty.
    let reconciler = Reconciler::new(&session.store, &session.store, MemoryCache::new());
    let resolution = reconciler.resolve_daily_assignment(&session.owner, date, force);

    if json {
        print_json(&resolution)?;
    } else if let Some(source) = resolution.source {
        let n = resolution.selected_subject_ids.len();
        println!("{date} [{source}]: {n} subject(s)");
        for id in &resolution.selected_subject_ids {
            println!("  {id}");
        }
    }

    if let Some(kind) = resolution.error {
        anyhow::bail!("could not resolve the list for {date}: {kind}");
    }
    Ok(())
}
