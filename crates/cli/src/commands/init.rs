//! `parlor init` — Write a default config file.

use std::path::Path;

use anyhow::Context;
use parlor_config::AppConfig;

pub fn run(config_path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = super::config_file(config_path);

    if path.exists() && !force {
        println!("Config already exists at {} (use --force to overwrite)", path.display());
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    std::fs::write(&path, AppConfig::default_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote default config to {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set provider.api_key (or export GOOGLE_API_KEY)");
    println!("  2. Set auth.jwt_secret / auth.public_key_pem, or switch auth.mode to \"static\"");
    println!("  3. Run `parlor doctor`, then `parlor serve`");

    Ok(())
}
