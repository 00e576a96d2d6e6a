pub mod retry;

use std::path::Path;
use tracing::info;

use crate::models::common::Config;
use crate::models::errors::ConfigError;

const ENV_PREFIX: &str = "INDEXER";

pub fn hex_to_u64(hex: String) -> Option<u64> {
    u64::from_str_radix(hex.trim_start_matches("0x"), 16).ok()
}

/// Parses a block number the node sent as a string. l2geth uses hex quantities,
/// some proxies forward plain decimal.
pub fn parse_block_number(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.starts_with("0x") || value.starts_with("0X") {
        hex_to_u64(value.to_lowercase())
    } else {
        value.parse::<u64>().ok()
    }
}

pub fn load_config<P: AsRef<Path>>(file_name: P) -> Result<Config, ConfigError> {
    // Build the path to the config file
    let manifest_dir = env!("CARGO_MANIFEST_DIR").to_string();
    let config_path = Path::new(&manifest_dir).join(file_name);
    info!("Config path: {}", config_path.to_string_lossy());

    // YAML file first, then INDEXER__* environment variables on top
    let settings = config::Config::builder()
        .add_source(config::File::from(config_path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config: Config = settings.try_deserialize()?;

    // Convert hyphens to underscores in all relevant fields
    config.chain_name = config.chain_name.replace('-', "_");

    Ok(config)
}

pub(crate) fn strip_html(error: &str) -> String {
    // If the error contains HTML tags, extract just the text content
    if error.contains("<!doctype html>") || error.contains("<html>") {
        // Remove all HTML tags and return the first non-empty line of text
        error
            .lines()
            .map(|line| line.trim())
            .find(|line| {
                !line.starts_with('<')
                    && !line.ends_with('>')
                    && !line.is_empty()
                    && !line.starts_with("<!")
                    && *line != "html"
                    && *line != "body"
            })
            .unwrap_or(error)
            .to_string()
    } else {
        // Return original error if no HTML
        error.to_string()
    }
}
