pub mod schema;
pub mod watcher;

pub use schema::{DaemonConfig, GlobalConfig};
pub use watcher::ConfigWatcher;

use sampled_core::{Result, SampleSetError};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file. Returns `DaemonConfig::default()`
/// if the file doesn't exist; otherwise the whole file is validated by
/// [`parse`] and rejected as a unit.
pub fn load(path: impl AsRef<Path>) -> Result<DaemonConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(DaemonConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| SampleSetError::Config(format!("cannot read '{}': {e}", path.display())))?;

    parse(&raw)
}

/// Parse and validate configuration text.
pub fn parse(raw: &str) -> Result<DaemonConfig> {
    let config: DaemonConfig =
        toml::from_str(raw).map_err(|e| SampleSetError::Config(format!("TOML parse error: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("sampled").join("sampled.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = load("/nonexistent/sampled/sampled.toml").unwrap();
        assert_eq!(cfg, DaemonConfig::default());
    }

    #[test]
    fn parse_rejects_invalid_toml() {
        assert!(matches!(parse("[[sample_set]"), Err(SampleSetError::Config(_))));
    }

    #[test]
    fn parse_validates() {
        let raw = "[global]\ntick_ms = 0\n";
        assert!(matches!(parse(raw), Err(SampleSetError::Config(_))));
    }

    #[test]
    fn default_path_ends_with_file_name() {
        assert!(default_path().ends_with("sampled/sampled.toml"));
    }
}
