//! Config commands.

use anyhow::{Context, Result};
use performer_core::config::PerformerConfig;

pub fn cmd_config_show() -> Result<()> {
    let path = PerformerConfig::file_path();
    let config = PerformerConfig::load().context("failed to load config")?;

    println!("# {} ({})", path.display(), if path.exists() { "file" } else { "defaults" });
    print!("{}", toml::to_string_pretty(&config).context("failed to render config")?);

    if let Err(e) = config.validate() {
        eprintln!();
        eprintln!("warning: {e}");
    }
    Ok(())
}

pub fn cmd_config_init() -> Result<()> {
    let path = PerformerConfig::write_default_if_missing().context("failed to write default config")?;
    println!("Config file: {}", path.display());
    Ok(())
}
