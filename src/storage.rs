use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::autotracker::AutotrackerRule;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub autotracker_rules: Vec<AutotrackerRule>,
}

pub fn read_token() -> Option<String> {
    if let Ok(value) = env::var("TOGGL_API_TOKEN") {
        if !value.trim().is_empty() {
            return Some(value.trim().to_string());
        }
    }

    let path = token_path()?;
    fs::read_to_string(path)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn write_token(token: &str) -> Result<(), io::Error> {
    let path = token_path()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Home directory not found"))?;
    fs::write(path, token)
}

fn token_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".togglsync");
    Some(path)
}

fn config_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".togglsync.json");
    Some(path)
}

fn home_config_path() -> Result<PathBuf, io::Error> {
    config_path().ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Home directory not found"))
}

pub fn read_config() -> Result<Config, io::Error> {
    read_config_from(&home_config_path()?)
}

pub fn write_config(config: &Config) -> Result<(), io::Error> {
    write_config_to(&home_config_path()?, config)
}

/// A missing file is an empty config. A file that exists but does not parse is an error, so
/// callers never overwrite settings they could not read.
pub fn read_config_from(path: &Path) -> Result<Config, io::Error> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(err) => return Err(err),
    };
    serde_json::from_str(&contents).map_err(|err| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid config {}: {err}", path.display()),
        )
    })
}

pub fn write_config_to(path: &Path, config: &Config) -> Result<(), io::Error> {
    let json = serde_json::to_string_pretty(config).map_err(io::Error::other)?;
    fs::write(path, json)
}

pub fn read_autotracker_rules() -> Result<Vec<AutotrackerRule>, io::Error> {
    Ok(read_config()?.autotracker_rules)
}

pub fn add_autotracker_rule(rule: AutotrackerRule) -> Result<(), io::Error> {
    add_autotracker_rule_to(&home_config_path()?, rule)
}

pub fn add_autotracker_rule_to(path: &Path, rule: AutotrackerRule) -> Result<(), io::Error> {
    let mut config = read_config_from(path)?;
    config.autotracker_rules.push(rule);
    write_config_to(path, &config)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    result.iter().map(|byte| format!("{:02x}", byte)).collect()
}
