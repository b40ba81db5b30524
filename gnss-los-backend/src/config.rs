use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gnss_los_core::{Color, OcclusionModel, EARTH_RADIUS_M};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const CONFIG_ENV: &str = "GNSS_LOS_CONFIG";

pub const MIN_FRAME_RATE_HZ: f64 = 0.001;
pub const MAX_FRAME_RATE_HZ: f64 = 1000.0;

/// One catalog file and how its bodies are drawn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display / group name. For the reference body this overrides the
    /// catalog's OBJECT_NAME.
    #[serde(default)]
    pub name: Option<String>,

    /// OMM JSON (`.json`) or three-line TLE (`.tle`, `.txt`) file
    pub source: PathBuf,

    /// "#rrggbb" or "#rrggbbaa"
    #[serde(default = "default_body_color")]
    pub color: String,
}

impl SourceConfig {
    pub fn color(&self) -> Color {
        Color::from_hex(&self.color).unwrap_or_else(|| {
            tracing::warn!("Invalid color '{}' for {:?}, using white", self.color, self.source);
            Color::WHITE
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Where the latest snapshot JSON is written
    pub path: PathBuf,

    /// Write every N ticks
    #[serde(default = "default_export_every")]
    pub every_ticks: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u64,

    #[serde(default = "default_occluder_radius")]
    pub occluder_radius_m: f64,

    #[serde(default)]
    pub occlusion_model: OcclusionModel,

    /// Ticks per second of wall-clock time
    #[serde(default = "default_frame_rate")]
    pub frame_rate_hz: f64,

    /// Simulation seconds per wall-clock second
    #[serde(default = "default_time_multiplier")]
    pub time_multiplier: f64,

    /// Simulation start; defaults to the reference body's epoch
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    /// Color of every LOS line
    #[serde(default = "default_line_color")]
    pub line_color: String,

    pub reference: SourceConfig,

    /// Constellations in load order
    #[serde(default)]
    pub groups: Vec<SourceConfig>,

    #[serde(default)]
    pub export: Option<ExportConfig>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_retention_days() -> u64 {
    3
}

fn default_occluder_radius() -> f64 {
    EARTH_RADIUS_M
}

fn default_frame_rate() -> f64 {
    30.0
}

fn default_time_multiplier() -> f64 {
    1.0
}

fn default_line_color() -> String {
    "#ffff00".to_string()
}

fn default_body_color() -> String {
    "#ffffff".to_string()
}

fn default_export_every() -> u64 {
    30
}

impl BackendConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: BackendConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(MIN_FRAME_RATE_HZ..=MAX_FRAME_RATE_HZ).contains(&self.frame_rate_hz) {
            anyhow::bail!(
                "frame_rate_hz must be between {} and {}, got {}",
                MIN_FRAME_RATE_HZ,
                MAX_FRAME_RATE_HZ,
                self.frame_rate_hz
            );
        }
        if !(self.time_multiplier.is_finite() && self.time_multiplier >= 0.0) {
            anyhow::bail!("time_multiplier must be >= 0, got {}", self.time_multiplier);
        }
        let mut seen: Vec<&str> = Vec::new();
        for (index, group) in self.groups.iter().enumerate() {
            let Some(name) = group.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
                anyhow::bail!("groups[{}] ({:?}) needs a name", index, group.source);
            };
            if seen.iter().any(|s| s.eq_ignore_ascii_case(name)) {
                anyhow::bail!("Duplicate group name '{}'", name);
            }
            seen.push(name);
        }
        if let Some(export) = &self.export {
            if export.every_ticks == 0 {
                anyhow::bail!("export.every_ticks must be >= 1");
            }
        }
        Ok(())
    }

    pub fn line_color(&self) -> Color {
        Color::from_hex(&self.line_color).unwrap_or(Color::YELLOW)
    }
}

pub static CONFIG: OnceLock<BackendConfig> = OnceLock::new();

/// Config path from the command line, then `GNSS_LOS_CONFIG`, then `config.toml`
pub fn config_path(arg: Option<&str>) -> PathBuf {
    arg.map(PathBuf::from)
        .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn read_config(path: impl AsRef<Path>) -> Result<&'static BackendConfig> {
    let config = BackendConfig::from_file(path)?;
    if CONFIG.set(config).is_err() {
        anyhow::bail!("Configuration already loaded");
    }
    CONFIG.get().context("Configuration missing after load")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [reference]
        source = "data/iss.json"
    "#;

    #[test]
    fn test_defaults() {
        let config = BackendConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.occluder_radius_m, EARTH_RADIUS_M);
        assert_eq!(config.occlusion_model, OcclusionModel::InfiniteLine);
        assert_eq!(config.frame_rate_hz, 30.0);
        assert_eq!(config.time_multiplier, 1.0);
        assert!(config.start_time.is_none());
        assert!(config.groups.is_empty());
        assert!(config.export.is_none());
        assert_eq!(config.reference.color(), Color::WHITE);
        assert_eq!(config.line_color(), Color::YELLOW);
    }

    #[test]
    fn test_full_config() {
        let config = BackendConfig::from_toml(r##"
            log_level = "debug"
            occlusion_model = "segment"
            time_multiplier = 60.0
            start_time = "2024-05-23T08:20:49Z"

            [reference]
            name = "ISS"
            source = "data/iss.json"
            color = "#ff0000"

            [[groups]]
            name = "GPS"
            source = "data/gps.json"
            color = "#0000ff"

            [[groups]]
            name = "Galileo"
            source = "data/galileo.tle"

            [export]
            path = "data/snapshot.json"
        "##).unwrap();

        assert_eq!(config.occlusion_model, OcclusionModel::Segment);
        assert_eq!(config.reference.color(), Color::RED);
        assert_eq!(config.groups.len(), 2);
        assert_eq!(config.groups[1].name.as_deref(), Some("Galileo"));
        assert_eq!(config.export.unwrap().every_ticks, 30);
        assert_eq!(config.start_time.unwrap().to_rfc3339(), "2024-05-23T08:20:49+00:00");
    }

    #[test]
    fn test_rejects_bad_rates() {
        let bad = format!("frame_rate_hz = 0.0\n{}", MINIMAL);
        assert!(BackendConfig::from_toml(&bad).is_err());
        let bad = format!("time_multiplier = -1.0\n{}", MINIMAL);
        assert!(BackendConfig::from_toml(&bad).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_frame_rate() {
        for rate in ["1e-30", "0.0001", "5000.0", "inf"] {
            let bad = format!("frame_rate_hz = {}\n{}", rate, MINIMAL);
            assert!(BackendConfig::from_toml(&bad).is_err(), "rate {}", rate);
        }
        let slow = format!("frame_rate_hz = 0.001\n{}", MINIMAL);
        assert_eq!(BackendConfig::from_toml(&slow).unwrap().frame_rate_hz, 0.001);
    }

    #[test]
    fn test_unnamed_group_rejected() {
        let err = BackendConfig::from_toml(&format!("{}\n[[groups]]\nsource = \"x.json\"\n", MINIMAL)).unwrap_err();
        assert!(err.to_string().contains("groups[0]"));
        let blank = format!("{}\n[[groups]]\nname = \"  \"\nsource = \"x.json\"\n", MINIMAL);
        assert!(BackendConfig::from_toml(&blank).is_err());
    }

    #[test]
    fn test_duplicate_group_names_rejected() {
        let toml = format!(
            "{}\n[[groups]]\nname = \"GPS\"\nsource = \"a.json\"\n[[groups]]\nname = \"gps\"\nsource = \"b.json\"\n",
            MINIMAL
        );
        let err = BackendConfig::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("Duplicate group name 'gps'"));
    }

    #[test]
    fn test_config_path_prefers_argument() {
        assert_eq!(config_path(Some("other.toml")), PathBuf::from("other.toml"));
    }
}
