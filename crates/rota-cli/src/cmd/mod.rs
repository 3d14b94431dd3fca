pub mod cohort;
pub mod config;
pub mod history;
pub mod init;
pub mod preview;
pub mod today;

use anyhow::Context;
use chrono::NaiveDate;
use rota_core::{config::Config, paths, store::RedbStore};
use std::path::Path;

/// Owner and opened store for one CLI invocation.
pub struct Session {
    pub owner: String,
    pub store: RedbStore,
}

impl Session {
    pub fn open(root: &Path, owner: Option<&str>) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load config")?;
        let owner = owner.unwrap_or(&config.owner).to_string();
        paths::validate_id(&owner)?;

        let db_path = config.db_path(root);
        let store = RedbStore::open(&db_path)
            .with_context(|| format!("failed to open store at {}", db_path.display()))?
            .with_concurrency(config.store.concurrency);

        Ok(Self { owner, store })
    }
}

pub fn date_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| chrono::Local::now().date_naive())
}

pub fn join_ids<'a>(ids: impl IntoIterator<Item = &'a String>) -> String {
    ids.into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
