//! Overlay configuration loaded from `lapstamp.toml`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Name of the settings file, looked up in the working directory.
pub const CONFIG_FILE: &str = "lapstamp.toml";

/// Style parameters for the burned-in timestamp, one `[timestamp]` table in
/// the settings file. Fields absent from the table fall back individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Text anchor in pixels, relative to the bottom-left corner of the frame.
    #[serde(default = "default_origin")]
    pub origin_px: [i32; 2],
    #[serde(default = "default_scale")]
    pub scale_factor: f32,
    #[serde(default = "default_color")]
    pub color_rgb_uint8: [u8; 3],
    #[serde(default = "default_thickness")]
    pub thickness_px: u32,
}

fn default_origin() -> [i32; 2] {
    [25, 25]
}

fn default_scale() -> f32 {
    2.0
}

fn default_color() -> [u8; 3] {
    [255, 0, 0]
}

fn default_thickness() -> u32 {
    3
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            origin_px: default_origin(),
            scale_factor: default_scale(),
            color_rgb_uint8: default_color(),
            thickness_px: default_thickness(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ConfigFile {
    timestamp: Option<OverlayConfig>,
}

/// Why a settings file could not be read as-is.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("config file not found: {0}")]
    Absent(#[source] std::io::Error),
    #[error("config file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config has no [timestamp] section; delete {CONFIG_FILE} and try again")]
    MissingSection,
}

fn read(path: &Path) -> Result<OverlayConfig, ConfigLoadError> {
    let content = std::fs::read_to_string(path).map_err(ConfigLoadError::Absent)?;
    let file: ConfigFile = toml::from_str(&content)?;
    file.timestamp.ok_or(ConfigLoadError::MissingSection)
}

/// Load the settings file, regenerating it with defaults when it is missing
/// or unparseable. A file that parses but lacks the `[timestamp]` section is
/// a fatal error: the user edited it into a shape we refuse to guess at.
pub fn load_or_init(path: &Path) -> Result<OverlayConfig> {
    match read(path) {
        Ok(config) => {
            info!(?path, "loaded overlay config");
            Ok(config)
        }
        Err(ConfigLoadError::MissingSection) => Err(ConfigLoadError::MissingSection.into()),
        Err(e) => {
            warn!(?path, %e, "config unreadable, regenerating with defaults");
            let config = OverlayConfig::default();
            write_config(path, &config)?;
            Ok(config)
        }
    }
}

/// Overwrite the settings file with defaults.
pub fn rebuild(path: &Path) -> Result<()> {
    write_config(path, &OverlayConfig::default())?;
    info!(?path, "config rebuilt with defaults");
    Ok(())
}

fn write_config(path: &Path, config: &OverlayConfig) -> Result<()> {
    let file = ConfigFile {
        timestamp: Some(config.clone()),
    };
    let content = toml::to_string_pretty(&file).context("failed to serialize config")?;
    std::fs::write(path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tracing_test::traced_test;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("lapstamp-{}-{}.toml", name, std::process::id()))
    }

    #[test]
    #[traced_test]
    fn absent_file_regenerates_defaults() {
        let path = temp_config_path("absent");
        let _ = std::fs::remove_file(&path);

        let config = load_or_init(&path).unwrap();
        assert_eq!(config, OverlayConfig::default());
        assert!(path.exists(), "defaults should have been persisted");

        let reread = load_or_init(&path).unwrap();
        assert_eq!(reread, OverlayConfig::default());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_file_regenerates_defaults() {
        let path = temp_config_path("malformed");
        std::fs::write(&path, "this is { not toml").unwrap();

        let config = load_or_init(&path).unwrap();
        assert_eq!(config, OverlayConfig::default());

        // The bad file was replaced with a parseable one.
        let reread = read(&path).unwrap();
        assert_eq!(reread, OverlayConfig::default());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_section_is_fatal() {
        let path = temp_config_path("nosection");
        std::fs::write(&path, "[other]\nkey = 1\n").unwrap();

        let err = load_or_init(&path).unwrap_err();
        assert!(err.to_string().contains("delete"), "got: {err}");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn partial_section_fills_field_defaults() {
        let path = temp_config_path("partial");
        std::fs::write(&path, "[timestamp]\nscale_factor = 1.5\n").unwrap();

        let config = load_or_init(&path).unwrap();
        assert_eq!(config.scale_factor, 1.5);
        assert_eq!(config.origin_px, [25, 25]);
        assert_eq!(config.color_rgb_uint8, [255, 0, 0]);
        assert_eq!(config.thickness_px, 3);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rebuild_round_trips_defaults() {
        let path = temp_config_path("rebuild");
        rebuild(&path).unwrap();

        let config = read(&path).unwrap();
        assert_eq!(config, OverlayConfig::default());

        let _ = std::fs::remove_file(&path);
    }
}
