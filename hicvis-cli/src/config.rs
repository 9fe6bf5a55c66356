//! Configuration handling for the HiCVis CLI
//!
//! Settings come from an optional `hicvis.toml` with `[viewer]`, `[render]`
//! and `[export]` tables; command-line flags override them afterwards.

use anyhow::{Context, Result};
use hicvis_core::ViewerConfig;
use hicvis_render::{ExportConfig, RenderConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, CliResult};

const DEFAULT_CONFIG_FILE: &str = "hicvis.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Load from `config_path`, or from `hicvis.toml` in the working
    /// directory if present, or fall back to defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        config.viewer.validate().context("Invalid [viewer] settings")?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::file_not_found(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> CliResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn example_toml() -> CliResult<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hicvis_render::Layer;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.viewer.debounce_ms, 50);
        assert_eq!(config.render.layer, Layer::Voronoi);
        assert!(config.export.show_footer);
    }

    #[test]
    fn test_partial_tables() {
        let config = Config::from_toml(
            r#"
            [viewer]
            percentile = 0.9

            [viewer.contacts]
            fill = false

            [render]
            layer = "density"

            [render.voronoi]
            edges = true
            "#,
        )
        .unwrap();
        assert_eq!(config.viewer.percentile, 0.9);
        assert_eq!(config.viewer.histogram_bins, 700);
        assert!(!config.viewer.contacts.fill);
        assert_eq!(config.render.layer, Layer::Density);
        assert!(config.render.voronoi.edges);
        assert_eq!(config.export.width, 800);
    }

    #[test]
    fn test_example_round_trip() {
        let text = Config::example_toml().unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[export]\ntitle = \"Dm6 contacts\"").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.export.title.as_deref(), Some("Dm6 contacts"));
    }

    #[test]
    fn test_invalid_viewer_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[viewer]\npercentile = 2.0").unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/hicvis.toml"))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::FileNotFound { .. })
        ));
    }
}
