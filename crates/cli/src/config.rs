use anyhow::{Context, Result};
use std::path::PathBuf;
use trajview_runtime_config::{ViewerConfig, CONFIG_FILE_NAME};

/// Get the config directory path (~/.config/trajview/)
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("trajview"))
}

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the user config. A missing file or home directory yields the defaults.
pub fn load_config() -> Result<ViewerConfig> {
    let Ok(path) = config_path() else {
        tracing::debug!("no home directory; using default config");
        return Ok(ViewerConfig::default());
    };
    trajview_runtime_config::load_from(&path)
        .with_context(|| format!("Failed to load config at {}", path.display()))
}

/// `trajview config`: print the effective configuration.
pub fn show_config(config: &ViewerConfig) -> Result<()> {
    match config_path() {
        Ok(path) if path.exists() => println!("# {}", path.display()),
        Ok(path) => println!("# {} (not found, using defaults)", path.display()),
        Err(_) => println!("# (no home directory, using defaults)"),
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    print!("{content}");
    Ok(())
}
