use std::path::PathBuf;

use anyhow::Result;

use crate::color::ColorScale;
use crate::config::ViewerConfig;
use crate::data::filter::{Region, sample_vectors, stride_for_paths};
use crate::data::model::{WindField, WindVector};
use crate::data::{catalog, loader, selector};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,

    /// Directory the candidates were listed from.
    pub data_dir: PathBuf,

    /// Dataset file names found in `data_dir`, newest name first.
    pub candidates: Vec<String>,

    /// Most recent candidate by embedded date.
    pub latest: Option<String>,

    /// File currently shown (None until something loads).
    pub shown: Option<String>,

    pub field: Option<WindField>,

    pub color_scale: ColorScale,

    /// Vectors drawn by the plot (cached).
    pub vectors: Vec<WindVector>,

    /// Lon/lat window vectors are sampled from.
    pub region: Region,

    /// Grid stride used for `vectors`.
    pub stride: usize,

    /// Snap the plot back to `region` on the next frame.
    pub reset_view: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a load is in progress.
    pub loading: bool,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        let wind = &config.wind;
        let color_scale = ColorScale::from_stops(
            &wind.color_scale,
            wind.min_velocity,
            wind.max_velocity,
            wind.opacity,
        )
        .unwrap_or_else(|e| {
            log::warn!("{e}; using generated colour ramp");
            ColorScale::hue_ramp(8, wind.min_velocity, wind.max_velocity, wind.opacity)
        });
        let region = Region::around(config.map.center, config.map.zoom);

        Self {
            data_dir: config.data_dir.clone(),
            config,
            candidates: Vec::new(),
            latest: None,
            shown: None,
            field: None,
            color_scale,
            vectors: Vec::new(),
            region,
            stride: 1,
            reset_view: true,
            status_message: None,
            loading: false,
        }
    }

    /// Re-list the dataset directory and load the latest dataset.
    pub fn refresh(&mut self) {
        self.candidates = match catalog::list_candidates(&self.data_dir) {
            Ok(names) => names,
            Err(e) => {
                log::error!("Failed to list datasets: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                self.candidates.clear();
                self.latest = None;
                return;
            }
        };

        self.latest = selector::select_latest(&self.candidates).cloned();
        match self.latest.clone() {
            Some(name) => {
                log::info!(
                    "Latest of {} datasets in {} is {name}",
                    self.candidates.len(),
                    self.data_dir.display()
                );
                if let Some(key) = selector::extract_date_key(&name) {
                    log::debug!("Selection key {} ({key})", key.as_u32());
                }
                self.load_dataset(&name);
            }
            None => {
                log::warn!("No dated dataset in {}", self.data_dir.display());
                self.status_message =
                    Some(format!("No dated dataset in {}", self.data_dir.display()));
            }
        }
    }

    /// Load one dataset by name. On failure the previous field stays shown.
    pub fn load_dataset(&mut self, name: &str) {
        self.loading = true;
        match self.try_load(name) {
            Ok(field) => {
                log::info!(
                    "Loaded {name}: {}x{} grid, reference time {}",
                    field.nx(),
                    field.ny(),
                    field.reference_time().unwrap_or("unknown")
                );
                self.field = Some(field);
                self.shown = Some(name.to_string());
                self.status_message = None;
                self.resample();
            }
            Err(e) => {
                log::error!("Error loading wind data: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
        self.loading = false;
    }

    fn try_load(&self, name: &str) -> Result<WindField> {
        let path = catalog::resolve(&self.data_dir, name)?;
        loader::load_file(&path)
    }

    /// Point at another dataset directory and reload.
    pub fn set_data_dir(&mut self, dir: PathBuf) {
        self.data_dir = dir;
        self.field = None;
        self.shown = None;
        self.vectors.clear();
        self.reset_view = true;
        self.refresh();
    }

    pub fn set_region(&mut self, region: Region) {
        self.region = region;
        self.resample();
    }

    /// Recompute `vectors` after a field or region change.
    pub fn resample(&mut self) {
        if let Some(field) = &self.field {
            self.stride = stride_for_paths(field, &self.region, self.config.wind.paths);
            self.vectors = sample_vectors(field, &self.region, self.stride);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn write_dataset(dir: &std::path::Path, name: &str, u: f64) {
        let header = |n: u32| {
            serde_json::json!({
                "parameterCategory": 2, "parameterNumber": n,
                "nx": 2, "ny": 2, "lo1": 68.0, "la1": 31.0, "dx": 1.0, "dy": 1.0
            })
        };
        let doc = serde_json::json!([
            { "header": header(2), "data": [u, u, u, u] },
            { "header": header(3), "data": [0.0, 0.0, 0.0, 0.0] },
        ]);
        std::fs::write(dir.join(name), doc.to_string()).unwrap();
    }

    fn state_for(dir: &std::path::Path) -> AppState {
        AppState::new(ViewerConfig {
            data_dir: dir.to_path_buf(),
            ..ViewerConfig::default()
        })
    }

    #[test]
    fn refresh_loads_latest_dataset() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), "gfs_20240723_00.json", 1.0);
        write_dataset(dir.path(), "gfs_20240725_00.json", 5.0);
        write_dataset(dir.path(), "gfs_20240724_00.json", 3.0);

        let mut state = state_for(dir.path());
        state.refresh();

        assert_eq!(state.candidates.len(), 3);
        assert_eq!(state.latest.as_deref(), Some("gfs_20240725_00.json"));
        assert_eq!(state.shown.as_deref(), Some("gfs_20240725_00.json"));
        assert_eq!(state.field.as_ref().unwrap().u, vec![5.0; 4]);
        assert_eq!(state.vectors.len(), 4);
        assert!(state.status_message.is_none());
    }

    #[test]
    fn refresh_prefers_latest_cycle_of_newest_day() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), "gfs_20240724_18.json", 0.5);
        for (cycle, u) in [("00", 1.0), ("06", 2.0), ("12", 3.0), ("18", 4.0)] {
            write_dataset(dir.path(), &format!("gfs_20240725_{cycle}.json"), u);
        }

        let mut state = state_for(dir.path());
        state.refresh();

        assert_eq!(state.candidates[0], "gfs_20240725_18.json");
        assert_eq!(state.latest.as_deref(), Some("gfs_20240725_18.json"));
        assert_eq!(state.shown.as_deref(), Some("gfs_20240725_18.json"));
        assert_eq!(state.field.as_ref().unwrap().u, vec![4.0; 4]);
    }

    #[test]
    fn undated_directory_reports_none() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), "readme.json", 1.0);

        let mut state = state_for(dir.path());
        state.refresh();

        assert_eq!(state.candidates, vec!["readme.json"]);
        assert!(state.latest.is_none());
        assert!(state.field.is_none());
        assert!(state.status_message.unwrap().contains("No dated dataset"));
    }

    #[test]
    fn failed_load_keeps_previous_field() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), "gfs_20240724_00.json", 2.0);

        let mut state = state_for(dir.path());
        state.refresh();
        assert!(state.field.is_some());

        std::fs::write(dir.path().join("gfs_20240725_00.json"), "{ truncated").unwrap();
        state.refresh();

        assert_eq!(state.latest.as_deref(), Some("gfs_20240725_00.json"));
        assert_eq!(state.shown.as_deref(), Some("gfs_20240724_00.json"));
        assert_eq!(state.field.as_ref().unwrap().u, vec![2.0; 4]);
        assert!(state.status_message.as_ref().unwrap().starts_with("Error"));
        assert!(!state.loading);

        // a later pick of a good file still works
        state.load_dataset("gfs_20240724_00.json");
        assert!(state.status_message.is_none());
    }

    #[test]
    fn missing_directory_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(&dir.path().join("absent"));
        state.refresh();
        assert!(state.candidates.is_empty());
        assert!(state.status_message.is_some());
    }

    #[test]
    fn region_change_resamples() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), "gfs_20240725_00.json", 5.0);
        let mut state = state_for(dir.path());
        state.refresh();

        state.set_region(Region {
            min_lon: 68.5,
            max_lon: 70.0,
            min_lat: -90.0,
            max_lat: 90.0,
        });
        assert_eq!(state.vectors.len(), 2);
        assert!(state.vectors.iter().all(|v| v.lon == 69.0));
    }
}
