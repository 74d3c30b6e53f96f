//! Service config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use paysim_core::error::{PaysimError, Result};

pub use schema::{AppConfig, ServerSection, SimulationSection};

/// Default config path, relative to the working directory.
pub const DEFAULT_PATH: &str = "paysim.yaml";

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PaysimError::Internal(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<AppConfig> {
    let cfg: AppConfig = serde_yaml::from_str(s)
        .map_err(|e| PaysimError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Pick the explicit config path: the CLI argument wins over `PAYSIM_CONFIG`.
/// Empty values count as unset.
pub fn resolve_path(cli_arg: Option<String>, env_var: Option<String>) -> Option<String> {
    let set = |p: &String| !p.is_empty();
    cli_arg.filter(set).or(env_var.filter(set))
}

/// Resolve the config source: an explicit path (see [`resolve_path`]) must
/// exist; the implicit default path falls back to built-in defaults.
pub fn load(explicit: Option<String>) -> Result<AppConfig> {
    load_or_default(explicit, DEFAULT_PATH)
}

pub fn load_or_default(explicit: Option<String>, default_path: &str) -> Result<AppConfig> {
    match explicit {
        Some(path) => load_from_file(&path),
        None if Path::new(default_path).exists() => load_from_file(default_path),
        None => {
            tracing::info!(path = default_path, "no config file, using defaults");
            let cfg = AppConfig::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }
}
