use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub format: Option<String>,
}

/// Profiles keyed by name, as stored in `config.toml`.
pub type ConfigFile = BTreeMap<String, ProfileConfig>;

/// `~/.salonads`, created on first use.
pub fn state_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".salonads");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn read_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

fn profile_in(dir: &Path, profile: &str) -> Result<ProfileConfig> {
    let mut all = read_file(&dir.join("config.toml"))?;
    Ok(all.remove(profile).unwrap_or_default())
}

fn save_in(dir: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let path = dir.join("config.toml");
    let mut all = read_file(&path)?;
    all.insert(profile.to_string(), config.clone());
    fs::write(path, toml::to_string_pretty(&all)?)?;
    Ok(())
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    profile_in(&state_dir()?, profile)
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    save_in(&state_dir()?, profile, config)
}

/// Flag or `SALONADS_URL` first, then the profile, then the server the
/// stored session belongs to.
pub fn resolve_server(cli_server: Option<&str>, profile: &str) -> Result<String> {
    if let Some(s) = cli_server {
        return Ok(s.to_string());
    }
    if let Some(s) = load_profile(profile)?.server {
        return Ok(s);
    }
    if let Ok(Some(session)) = crate::session::load(profile) {
        return Ok(session.server);
    }
    anyhow::bail!(
        "No server URL configured. Use --server, set SALONADS_URL, or run: salonads config set server <url>"
    )
}
