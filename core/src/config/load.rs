use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default buildd data directory: ~/.buildd
pub fn get_buildd_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".buildd"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.buildd/config.toml (highest)
    // Priority 2: ./buildd.toml (current directory)
    let user_config = get_buildd_data_dir()
        .map(|d| d.join("config.toml"))
        .ok()
        .filter(|p| p.exists());
    let local_config = Path::new("buildd.toml");

    let mut cfg = match user_config {
        Some(path) => load_from_path(&path)?,
        None if local_config.exists() => load_from_path(local_config)?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok());
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(cfg)
}

/// Environment variable overrides (highest priority).
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("BUILDD_PROGRAM") {
        cfg.build_tool.program = Some(v);
    }
    if let Some(v) = get("BUILDD_HOST") {
        cfg.server.host = v;
    }
    if let Some(v) = get("BUILDD_PORT") {
        match v.trim().parse::<u16>() {
            Ok(port) => cfg.server.port = port,
            Err(_) => tracing::warn!(value = %v, "ignoring invalid BUILDD_PORT"),
        }
    }
    if let Some(v) = get("BUILDD_LOG_LEVEL") {
        cfg.logging.level = v;
    }
}
