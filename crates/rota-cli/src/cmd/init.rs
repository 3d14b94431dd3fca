use anyhow::Context;
use rota_core::{config::Config, io, paths, store::RedbStore};
use std::path::Path;

pub fn run(root: &Path, owner: Option<&str>) -> anyhow::Result<()> {
    println!("Initializing rota in: {}", root.display());

    let dir = paths::rota_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config = if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to load config")?
    } else {
        let owner = owner.unwrap_or("default");
        paths::validate_id(owner)?;
        let cfg = Config::new(owner);
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    let db_path = config.db_path(root);
    let existed = db_path.exists();
    RedbStore::open(&db_path)
        .with_context(|| format!("failed to create store at {}", db_path.display()))?;
    let label = if existed { "exists: " } else { "created:" };
    println!("  {label} {}", db_path.display());

    println!("\nNext: rota cohort import <cohorts.yaml>");
    Ok(())
}
