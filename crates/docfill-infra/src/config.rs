//! Configuration loader for docfill.
//!
//! Reads `config.toml` from the data directory (`~/.docfill/` in production)
//! and deserializes it into [`DocfillConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::Path;

use docfill_types::config::DocfillConfig;

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`DocfillConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
/// - A `max_concurrency` of zero is raised to one.
pub async fn load_config(data_dir: &Path) -> DocfillConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return DocfillConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return DocfillConfig::default();
        }
    };

    let mut config = match toml::from_str::<DocfillConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            return DocfillConfig::default();
        }
    };

    if config.generation.max_concurrency == 0 {
        tracing::warn!("generation.max_concurrency = 0 is invalid, using 1");
        config.generation.max_concurrency = 1;
    }
    config
}
