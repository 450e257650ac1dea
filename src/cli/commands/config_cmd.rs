//! Configuration inspection.

use centris::config::{Config, Settings};

use crate::cli::icons::{dim_arrow, info};

/// Print the effective settings as JSON, noting where they came from.
pub fn cmd_config(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => eprintln!("{} Config file: {}", info(), path.display()),
        None => eprintln!("{} No config file found; using defaults", info()),
    }
    if let Some(ref url) = settings.render.remote_url {
        eprintln!("  {} Remote browser: {}", dim_arrow(), url);
    }

    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}
