//! Configuration display command.

use console::style;

use crate::cli::icons::{dim_arrow, info};
use crate::config::{Config, Settings};

/// Print the effective configuration as TOML.
pub fn cmd_config_show(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => eprintln!("{} Loaded from {}", info(), path.display()),
        None => eprintln!("{} No config file found; showing defaults", info()),
    }
    eprintln!(
        "  {} API key: {}",
        dim_arrow(),
        if settings.llm.api_key().is_some() {
            style("set").green()
        } else {
            style("not set").yellow()
        }
    );
    eprintln!();

    // Settings carry overrides from the command line on top of the file
    let effective = Config {
        docs_dir: Some(settings.docs_dir.display().to_string()),
        llm: settings.llm.clone(),
        retrieval: settings.retrieval.clone(),
        source_path: None,
    };
    print!("{}", effective.to_toml()?);

    Ok(())
}
