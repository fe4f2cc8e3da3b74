use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$CONSOL_HOME`, else `~/.consol`.
pub fn consol_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("CONSOL_HOME").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".consol"))
}

pub fn ensure_consol_home() -> Result<PathBuf> {
    let dir = consol_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
