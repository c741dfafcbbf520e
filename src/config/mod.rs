pub mod settings;

pub use settings::{
    Config, LlmProvider, LlmSettings, LoggingSettings, PosterSettings, SearchProviderKind,
    SearchSettings,
};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Failed to get config directory")?
        .join("mediascout");

    fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

    Ok(config_dir.join("config.toml"))
}

/// Load configuration from the default location, or create it with defaults.
pub fn load_or_create_config() -> Result<Config> {
    load_or_create_config_at(&config_path()?)
}

/// Load configuration from `path`, writing a default file there if none exists.
pub fn load_or_create_config_at(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.llm.fill_provider_defaults();
        Ok(config)
    } else {
        let config = Config::default();
        save_config_at(&config, path)?;
        tracing::info!(path = %path.display(), "created default config");
        Ok(config)
    }
}

/// Save configuration to the default location
pub fn save_config(config: &Config) -> Result<()> {
    save_config_at(config, &config_path()?)
}

pub fn save_config_at(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}
