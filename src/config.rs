/// JSON configuration file handling.
use crate::errors::{ProxyError, ProxyResult};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub printful: PrintfulConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrintfulConfig {
    /// API bearer token for the authenticated endpoints.
    pub access_token: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Run a catalog warm sweep in the background on startup.
    #[serde(default = "default_warm_on_startup")]
    pub warm_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path of the sqlite entity cache. Created on first run.
    pub path: String,
}

fn default_request_timeout() -> u64 {
    10
}

fn default_warm_on_startup() -> bool {
    true
}

pub fn read_config<P: AsRef<Path>>(path: P) -> ProxyResult<Config> {
    let raw = fs::read_to_string(&path).map_err(|e| {
        ProxyError::Config(format!("cannot read {}: {}", path.as_ref().display(), e))
    })?;
    Ok(serde_json::from_str(&raw)?)
}
