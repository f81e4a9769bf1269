//! Configuration for the earth viewer.

use std::path::{Path, PathBuf};

use animator::AnimatorConfig;
use flow_common::{FlowError, FlowResult, ParticleTuning, View};
use projection::GlobeKind;
use serde::{Deserialize, Serialize};
use vector_field::BuilderConfig;

/// Top-level viewer configuration, loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Size of the rendered frames.
    pub view: View,

    pub builder: BuilderConfig,

    pub animator: AnimatorConfig,

    pub globe: GlobeConfig,

    pub grid: GridConfig,

    /// Overlay to show. `None` or `"off"` hides it.
    pub overlay_type: Option<String>,

    /// Plot the overlay grid's lattice points over the overlay.
    pub show_grid_points: bool,

    /// Directory that receives `frame-NNNN.png` and `scale.png`.
    pub output_dir: PathBuf,

    /// Number of animation frames to write.
    pub frames: u64,

    /// Address for the Prometheus scrape endpoint, e.g. `0.0.0.0:9100`.
    pub metrics_listen: Option<String>,

    /// Style file replacing the built-in color scales.
    pub styles_path: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            view: View::default(),
            builder: BuilderConfig::default(),
            animator: AnimatorConfig::default(),
            globe: GlobeConfig::default(),
            grid: GridConfig::default(),
            overlay_type: Some("default".to_string()),
            show_grid_points: false,
            output_dir: PathBuf::from("frames"),
            frames: 40,
            metrics_listen: None,
            styles_path: None,
        }
    }
}

/// Projection and its center.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub projection: GlobeKind,
    pub center_lon: f64,
    pub center_lat: f64,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            projection: GlobeKind::Orthographic,
            center_lon: -30.0,
            center_lat: 20.0,
        }
    }
}

impl GlobeConfig {
    pub fn center(&self) -> (f64, f64) {
        (self.center_lon, self.center_lat)
    }
}

/// Where grid data comes from and how it is styled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// grib2json file holding the primary grid. The synthetic wind field when absent.
    pub source: Option<PathBuf>,

    /// Color scale for the primary grid.
    pub style: String,

    /// Particle tuning for a vector primary grid.
    pub particles: ParticleTuning,

    /// grib2json file holding a distinct overlay grid.
    pub overlay: Option<PathBuf>,

    /// Color scale for the overlay grid.
    pub overlay_style: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            source: None,
            style: "wind".to_string(),
            particles: ParticleTuning::default(),
            overlay: None,
            overlay_style: "temp".to_string(),
        }
    }
}

impl ViewerConfig {
    pub fn from_yaml(yaml: &str) -> FlowResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| FlowError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> FlowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FlowError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Apply `EARTH_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply `EARTH_*` overrides using `lookup` to read variables. Unparsable values
    /// are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(width) = lookup("EARTH_VIEW_WIDTH").and_then(|v| v.parse().ok()) {
            self.view.width = width;
        }

        if let Some(height) = lookup("EARTH_VIEW_HEIGHT").and_then(|v| v.parse().ok()) {
            self.view.height = height;
        }

        if let Some(dir) = lookup("EARTH_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }

        if let Some(val) = lookup("EARTH_MOBILE") {
            self.animator.mobile = parse_flag(&val);
        }

        if let Some(val) = lookup("EARTH_SHOW_GRID_POINTS") {
            self.show_grid_points = parse_flag(&val);
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> FlowResult<()> {
        if self.view.width == 0 || self.view.height == 0 {
            return Err(FlowError::Config(format!(
                "view must be non-empty, got {}x{}",
                self.view.width, self.view.height
            )));
        }

        if self.frames == 0 {
            return Err(FlowError::Config("frames must be > 0".to_string()));
        }

        if !(0.0..=1.0).contains(&self.animator.fade_alpha) {
            return Err(FlowError::Config(format!(
                "animator.fade_alpha must be within [0, 1], got {}",
                self.animator.fade_alpha
            )));
        }

        Ok(())
    }

    /// Whether the overlay is drawn at all.
    pub fn overlay_enabled(&self) -> bool {
        overlay_enabled(self.overlay_type.as_deref())
    }
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

/// An overlay type is shown unless it is absent or `"off"`.
pub fn overlay_enabled(overlay_type: Option<&str>) -> bool {
    matches!(overlay_type, Some(kind) if kind != "off")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_is_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.overlay_enabled());
        assert!(!config.show_grid_points);
        assert_eq!(config.grid.style, "wind");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("EARTH_VIEW_WIDTH", "320"),
            ("EARTH_VIEW_HEIGHT", "not-a-number"),
            ("EARTH_OUTPUT_DIR", "/tmp/out"),
            ("EARTH_MOBILE", "TRUE"),
            ("EARTH_SHOW_GRID_POINTS", "1"),
        ]
        .into_iter()
        .collect();

        let mut config = ViewerConfig::default();
        config.apply_env_with(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.view.width, 320);
        assert_eq!(config.view.height, 640);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert!(config.animator.mobile);
        assert!(config.show_grid_points);
    }

    #[test]
    fn test_overlay_enabled() {
        assert!(overlay_enabled(Some("default")));
        assert!(overlay_enabled(Some("temp")));
        assert!(!overlay_enabled(Some("off")));
        assert!(!overlay_enabled(None));
    }

    #[test]
    fn test_validate_rejects_empty_view() {
        let config = ViewerConfig {
            view: View::new(0, 10),
            ..ViewerConfig::default()
        };
        assert!(matches!(config.validate(), Err(FlowError::Config(_))));
    }
}
