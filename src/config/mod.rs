mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./dubforge.toml",
        "~/.config/dubforge/config.toml",
        "/etc/dubforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.retention.window_secs == 0 {
        anyhow::bail!("Retention window cannot be 0");
    }
    if config.retention.sweep_interval_secs == 0 {
        anyhow::bail!("Retention sweep interval cannot be 0");
    }

    if config.pipeline.long_mode_threshold_min <= 0.0 {
        anyhow::bail!("Long-mode threshold must be positive");
    }
    if config.pipeline.source_lang.is_empty() || config.pipeline.target_lang.is_empty() {
        anyhow::bail!("Source and target languages cannot be empty");
    }

    if !config.storage.data_dir.exists() {
        tracing::warn!(
            "Data directory does not exist yet: {:?} (created at startup)",
            config.storage.data_dir
        );
    }

    Ok(())
}
