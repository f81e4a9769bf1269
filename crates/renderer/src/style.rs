//! Style configuration for overlay color scales.

use std::collections::HashMap;
use std::sync::Arc;

use flow_common::{ColorScale, FlowError, FlowResult, Rgba};
use serde::{Deserialize, Serialize};

use crate::gradient::{SegmentedScale, SinebowScale};

/// Styles bundled with the renderer.
const BUILTIN_STYLES: &str = include_str!("../styles/earth.json");

/// Style configuration loaded from JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleConfig {
    pub version: String,
    pub styles: HashMap<String, StyleDefinition>,
}

/// A single style definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleDefinition {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub style_type: StyleType,
    pub units: Option<String>,
    pub stops: Vec<ColorStop>,
}

/// How the stops of a style are turned into a scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleType {
    /// Piecewise-linear between the stops
    Segmented,
    /// Sinebow spanning the first and last stop values
    Sinebow,
    /// Sinebow fading to white, spanning the first and last stop values
    ExtendedSinebow,
}

/// Color stop for gradient
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColorStop {
    pub value: f64,
    pub color: String,
    pub label: Option<String>,
}

impl StyleConfig {
    /// Load style configuration from JSON string
    pub fn from_json(json_str: &str) -> FlowResult<Self> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Load style configuration from file
    pub fn from_file(path: &str) -> FlowResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// The styles shipped with the renderer.
    pub fn builtin() -> FlowResult<Self> {
        Self::from_json(BUILTIN_STYLES)
    }

    /// Get a specific style definition
    pub fn get_style(&self, name: &str) -> Option<&StyleDefinition> {
        self.styles.get(name)
    }

    /// Build the color scale for a named style.
    pub fn scale(&self, name: &str) -> FlowResult<Arc<dyn ColorScale>> {
        self.get_style(name)
            .ok_or_else(|| FlowError::Config(format!("unknown style '{}'", name)))?
            .to_scale()
    }
}

impl StyleDefinition {
    /// Build the color scale described by this style.
    pub fn to_scale(&self) -> FlowResult<Arc<dyn ColorScale>> {
        let mut segments = Vec::with_capacity(self.stops.len());
        for stop in &self.stops {
            let (r, g, b) = hex_to_rgb(&stop.color).ok_or_else(|| {
                FlowError::Config(format!(
                    "style '{}': invalid color '{}'",
                    self.name, stop.color
                ))
            })?;
            segments.push((stop.value, Rgba::new(r, g, b, 255)));
        }

        let scale = SegmentedScale::new(segments).ok_or_else(|| {
            FlowError::Config(format!(
                "style '{}' needs at least two finite stops",
                self.name
            ))
        })?;

        let scale: Arc<dyn ColorScale> = match self.style_type {
            StyleType::Segmented => Arc::new(scale),
            StyleType::Sinebow => {
                let (low, high) = scale.bounds();
                Arc::new(SinebowScale::new(low, high))
            }
            StyleType::ExtendedSinebow => {
                let (low, high) = scale.bounds();
                Arc::new(SinebowScale::extended(low, high))
            }
        };
        Ok(scale)
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}
