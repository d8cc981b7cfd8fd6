use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::parse_css_color;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GFS_WIND_VIEWER_CONFIG";
/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "gfs-wind-viewer.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Map view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapStyle {
    #[default]
    Dark,
    Light,
    Streets,
    Satellite,
}

impl MapStyle {
    /// Plot background for the style.
    pub fn background(self) -> eframe::egui::Color32 {
        use eframe::egui::Color32;
        match self {
            MapStyle::Dark => Color32::from_rgb(0x19, 0x1a, 0x1a),
            MapStyle::Light => Color32::from_rgb(0xf2, 0xf3, 0xf0),
            MapStyle::Streets => Color32::from_rgb(0xe9, 0xe5, 0xdc),
            MapStyle::Satellite => Color32::from_rgb(0x0b, 0x1d, 0x2c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[default]
    Mercator,
    Equirectangular,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapOptions {
    /// `[lon, lat]` of the initial view.
    pub center: [f64; 2],
    pub zoom: f64,
    pub style: MapStyle,
    pub projection: Projection,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: [69.3451, 30.3753],
            zoom: 4.5,
            style: MapStyle::Dark,
            projection: Projection::Mercator,
        }
    }
}

// ---------------------------------------------------------------------------
// National boundary overlay
// ---------------------------------------------------------------------------

/// Vector tile overlay settings. Kept for display; tiles are not fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoundaryOptions {
    pub tiles: String,
    pub source_layer: String,
    pub line_color: String,
    pub line_width: f32,
    pub line_opacity: f32,
    pub visible: bool,
}

impl Default for BoundaryOptions {
    fn default() -> Self {
        Self {
            tiles: "http://localhost:8080/geoserver/gwc/service/tms/1.0.0/\
                    National_Boundary@EPSG:900913@pbf/{z}/{x}/{y}.pbf"
                .to_string(),
            source_layer: "National_Boundary".to_string(),
            line_color: "yellow".to_string(),
            line_width: 2.0,
            line_opacity: 0.8,
            visible: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Wind layer
// ---------------------------------------------------------------------------

pub const DEFAULT_COLOR_SCALE: [&str; 15] = [
    "rgb(255,165,0)",
    "rgb(255,215,0)",
    "rgb(255,255,0)",
    "rgb(255,255,51)",
    "rgb(255,255,102)",
    "rgb(255,255,178)",
    "rgb(255,255,224)",
    "rgb(248,248,255)",
    "rgb(240,248,255)",
    "rgb(173,216,230)",
    "rgb(135,206,250)",
    "rgb(0,191,255)",
    "rgb(0,204,255)",
    "rgb(0,153,255)",
    "rgb(0,102,255)",
];

/// Wind layer options, named as the web wind layer names them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindLayerOptions {
    pub line_width: f32,
    /// Speed mapped to the first colour stop, m/s.
    pub min_velocity: f64,
    /// Speed mapped to the last colour stop, m/s.
    pub max_velocity: f64,
    pub particle_age: u32,
    pub particle_multiplier: f64,
    pub opacity: f32,
    pub color_scale: Vec<String>,
    pub frame_rate: u32,
    pub max_age: u32,
    pub global_alpha: f32,
    /// Degrees of arrow length per m/s.
    pub velocity_scale: f64,
    /// Upper bound on drawn vectors.
    pub paths: usize,
}

impl Default for WindLayerOptions {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            min_velocity: 0.0,
            max_velocity: 6.0,
            particle_age: 90,
            particle_multiplier: 1.0 / 100.0,
            opacity: 0.97,
            color_scale: DEFAULT_COLOR_SCALE.iter().map(|s| s.to_string()).collect(),
            frame_rate: 30,
            max_age: 60,
            global_alpha: 0.95,
            velocity_scale: 0.01,
            paths: 7000,
        }
    }
}

// ---------------------------------------------------------------------------
// ViewerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Directory holding `gfs_YYYYMMDD_HH.json` datasets.
    pub data_dir: PathBuf,
    pub map: MapOptions,
    pub boundary: BoundaryOptions,
    pub wind: WindLayerOptions,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("json"),
            map: MapOptions::default(),
            boundary: BoundaryOptions::default(),
            wind: WindLayerOptions::default(),
        }
    }
}

impl ViewerConfig {
    /// Read and validate a config file. Absent keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ViewerConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Config from `$GFS_WIND_VIEWER_CONFIG`, else `./gfs-wind-viewer.json`,
    /// else defaults. A broken file is logged and replaced by defaults.
    pub fn discover() -> Self {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(p) => PathBuf::from(p),
            None => {
                let local = PathBuf::from(CONFIG_FILE);
                if !local.is_file() {
                    log::debug!("No {CONFIG_FILE} found, using defaults");
                    return Self::default();
                }
                local
            }
        };

        match Self::load(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("{e}; using defaults");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let wind = &self.wind;
        if !(wind.min_velocity < wind.max_velocity) {
            return Err(ConfigError::Invalid(format!(
                "minVelocity ({}) must be below maxVelocity ({})",
                wind.min_velocity, wind.max_velocity
            )));
        }
        if wind.paths == 0 {
            return Err(ConfigError::Invalid("paths must be at least 1".into()));
        }
        for (name, value) in [("opacity", wind.opacity), ("globalAlpha", wind.global_alpha)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} ({value}) must be within 0..=1"
                )));
            }
        }
        if let Some(bad) = wind
            .color_scale
            .iter()
            .find(|stop| parse_css_color(stop).is_err())
        {
            return Err(ConfigError::Invalid(format!("unparseable colour stop {bad:?}")));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_layer_options() {
        let config = ViewerConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("json"));
        assert_eq!(config.map.zoom, 4.5);
        assert_eq!(config.wind.max_velocity, 6.0);
        assert_eq!(config.wind.paths, 7000);
        assert_eq!(config.wind.color_scale.len(), 15);
        assert_eq!(config.wind.color_scale[0], "rgb(255,165,0)");
        config.validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ViewerConfig = serde_json::from_str(
            r#"{ "dataDir": "/srv/json", "map": { "style": "light" }, "wind": { "maxVelocity": 20 } }"#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/json"));
        assert_eq!(config.map.style, MapStyle::Light);
        assert_eq!(config.map.center, [69.3451, 30.3753]);
        assert_eq!(config.wind.max_velocity, 20.0);
        assert_eq!(config.wind.velocity_scale, 0.01);
        assert!(config.boundary.visible);
    }

    #[test]
    fn validate_rejects_bad_options() {
        let mut config = ViewerConfig::default();
        config.wind.min_velocity = 6.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ViewerConfig::default();
        config.wind.paths = 0;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.wind.opacity = 1.5;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.wind.color_scale.push("chartreuse-ish".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reports_io_and_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(matches!(
            ViewerConfig::load(&missing),
            Err(ConfigError::Io { .. })
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            ViewerConfig::load(&broken),
            Err(ConfigError::Parse { .. })
        ));

        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{ "wind": { "paths": 500 } }"#).unwrap();
        assert_eq!(ViewerConfig::load(&good).unwrap().wind.paths, 500);
    }
}
