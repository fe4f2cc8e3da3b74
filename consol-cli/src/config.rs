use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_consol_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub export: ExportSection,
    pub docs: DocsSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// Used when `consolidate` gets no `--out`; the extension picks the format.
    pub default_output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsSection {
    /// Where bare template names are looked up.
    pub templates_dir: String,
    pub image_token: String,
    pub table_token: String,
    /// Workbook sheet holding the NAV workings.
    pub nav_sheet: String,
    pub image_width_inches: f64,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            default_output: "consolidated_summary.xlsx".to_string(),
        }
    }
}

impl Default for DocsSection {
    fn default() -> Self {
        Self {
            templates_dir: "templates".to_string(),
            image_token: "<<valuation.jpg>>".to_string(),
            table_token: "<<nav_table>>".to_string(),
            nav_sheet: "NAV Calculation Working".to_string(),
            image_width_inches: 5.0,
        }
    }
}

impl DocsSection {
    /// `name` as given when it exists, otherwise under the templates dir.
    pub fn resolve_template(&self, name: &Path) -> PathBuf {
        if name.exists() || name.is_absolute() {
            name.to_path_buf()
        } else {
            Path::new(&self.templates_dir).join(name)
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_consol_home()?.join("config.toml"))
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
