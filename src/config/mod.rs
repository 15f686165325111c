//! Application Configuration
//!
//! User settings and preferences stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tracking pool settings
    pub tracking: TrackingSettings,
    /// Style generation settings
    pub style: StyleSettings,
    /// Candidate detection settings
    pub detection: DetectionSettings,
}

/// Tracking pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSettings {
    /// Number of images tracked simultaneously
    pub capacity: usize,
    /// Seconds without a tracked anchor update before a slot is declared
    /// lost
    pub timeout_secs: f64,
    /// Physical width assumed for detected rectangles, in meters
    pub physical_width_m: f32,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            capacity: 2,
            timeout_secs: 10.0,
            physical_width_m: 0.1,
        }
    }
}

/// Style generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleSettings {
    /// Whether slots start with style fading enabled
    pub fade_by_default: bool,
    /// Pause between generations while the fade loop runs, in
    /// milliseconds
    pub cycle_delay_ms: u64,
    /// Simulated model latency of the demo generator, in milliseconds
    pub simulated_latency_ms: u64,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            fade_by_default: true,
            cycle_delay_ms: 400,
            simulated_latency_ms: 150,
        }
    }
}

/// Candidate detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// Minimum width/height for a trackable reference image
    pub min_dimension: u32,
    /// Minimum luminance standard deviation for a trackable reference
    /// image
    pub min_contrast: f32,
    /// Edge length of synthetic candidates produced by the demo detector
    pub candidate_size: u32,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            min_dimension: 32,
            min_contrast: 8.0,
            candidate_size: 256,
        }
    }
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "artrack", "ArTrack")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert_eq!(config.tracking.capacity, 2);
        assert!((config.tracking.timeout_secs - 10.0).abs() < 0.01);
        assert!((config.tracking.physical_width_m - 0.1).abs() < 0.001);

        assert!(config.style.fade_by_default);
        assert_eq!(config.style.cycle_delay_ms, 400);
        assert_eq!(config.style.simulated_latency_ms, 150);

        assert_eq!(config.detection.min_dimension, 32);
        assert!((config.detection.min_contrast - 8.0).abs() < 0.01);
        assert_eq!(config.detection.candidate_size, 256);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig::default();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.tracking.capacity, parsed.tracking.capacity);
        assert_eq!(config.style.cycle_delay_ms, parsed.style.cycle_delay_ms);
        assert_eq!(
            config.detection.min_dimension,
            parsed.detection.min_dimension
        );
    }

    #[test]
    fn test_config_with_custom_values() {
        let mut config = AppConfig::default();
        config.tracking.capacity = 4;
        config.tracking.timeout_secs = 2.5;
        config.style.fade_by_default = false;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.tracking.capacity, 4);
        assert!((parsed.tracking.timeout_secs - 2.5).abs() < 0.01);
        assert!(!parsed.style.fade_by_default);
    }

    #[test]
    fn test_save_and_load_config() {
        let config = AppConfig::default();

        let temp_file = NamedTempFile::new().unwrap();

        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(config.tracking.capacity, loaded.tracking.capacity);
        assert_eq!(config.style.fade_by_default, loaded.style.fade_by_default);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
