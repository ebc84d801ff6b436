use std::env;
use std::path::{Path, PathBuf};

use tessel_config::Config;

const DEFAULT_CONFIG_FILE: &str = "tessel.json";

/// Resolve the config: explicit path, then `TESSEL_CONFIG`, then `./tessel.json`,
/// then environment defaults
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        tracing::info!("Loading config from {}", path.display());
        return Config::load(path);
    }

    if let Ok(path) = env::var("TESSEL_CONFIG") {
        tracing::info!("Loading config from TESSEL_CONFIG={path}");
        return Config::load(Path::new(&path));
    }

    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        tracing::info!("Loading config from {}", local.display());
        return Config::load(&local);
    }

    tracing::debug!("No config file found, using defaults");
    Ok(Config::new())
}

/// Command line flags win over file and environment
pub fn apply_overrides(config: &mut Config, language: Option<String>, any_type: bool) {
    if let Some(language) = language {
        config.ocr.language = language;
    }
    if any_type {
        config.ocr.strict_media_types = false;
    }
}
