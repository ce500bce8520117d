use anyhow::{Result, anyhow};
use std::fs;
use std::path::PathBuf;

pub fn get_quick_copy_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
    Ok(home.join(".quick-copy"))
}

pub fn get_config_path() -> Result<PathBuf> {
    let dir = get_quick_copy_dir()?;
    Ok(dir.join("config.toml"))
}

/// Primary store: SQLite key-value table.
pub fn get_database_path() -> Result<PathBuf> {
    let dir = get_quick_copy_dir()?;
    Ok(dir.join("quick-copy.db"))
}

/// Legacy store, consulted once for migration when the database is empty.
pub fn get_legacy_store_path() -> Result<PathBuf> {
    let dir = get_quick_copy_dir()?;
    Ok(dir.join("sync.json"))
}

pub fn get_log_path() -> Result<PathBuf> {
    let dir = get_quick_copy_dir()?;
    Ok(dir.join("quick-copy.log"))
}

pub fn ensure_directories_exist() -> Result<()> {
    let dir = get_quick_copy_dir()?;

    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }

    Ok(())
}
