//! Grid loading: grib2json records and the built-in synthetic wind field.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use flow_common::{
    ColorScale, FlowError, FlowResult, Grid, GridData, GridPair, GridSpec, ParticleTuning,
    RegularGrid,
};
use renderer::StyleConfig;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::config::GridConfig;

/// Header of one grib2json record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordHeader {
    pub nx: usize,
    pub ny: usize,
    pub lo1: f64,
    pub la1: f64,
    pub dx: f64,
    pub dy: f64,
    pub ref_time: DateTime<Utc>,
    /// Hours after `ref_time`.
    #[serde(default)]
    pub forecast_time: i64,
    #[serde(default)]
    pub parameter_number_name: Option<String>,
    #[serde(default)]
    pub parameter_unit: Option<String>,
}

impl RecordHeader {
    pub fn spec(&self) -> GridSpec {
        GridSpec {
            nx: self.nx,
            ny: self.ny,
            lo1: self.lo1,
            la1: self.la1,
            dx: self.dx,
            dy: self.dy,
        }
    }

    /// Valid time of the record.
    pub fn date(&self) -> DateTime<Utc> {
        self.ref_time + Duration::hours(self.forecast_time)
    }
}

/// One grib2json record. Missing values are `null`.
#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    pub header: RecordHeader,
    pub data: Vec<Option<f32>>,
}

impl Record {
    fn values(&self) -> Vec<f32> {
        self.data.iter().map(|v| v.unwrap_or(f32::NAN)).collect()
    }
}

/// Parse grib2json text into a grid.
///
/// One record yields a scalar grid; two or more yield a vector grid from the first two
/// (U then V), which must share a lattice. Vector grids carry `particles`.
pub fn parse_grib2json(
    json: &str,
    name: &str,
    scale: Arc<dyn ColorScale>,
    particles: ParticleTuning,
) -> FlowResult<RegularGrid> {
    let records: Vec<Record> = serde_json::from_str(json)?;

    match records.as_slice() {
        [] => Err(FlowError::InvalidGrid(format!("{}: no records", name))),
        [scalar] => {
            debug!(
                grid = name,
                parameter = scalar.header.parameter_number_name.as_deref().unwrap_or("-"),
                "Parsed scalar record"
            );
            RegularGrid::new(
                name,
                scalar.header.date(),
                scalar.header.spec(),
                GridData::Scalar(scalar.values()),
                scale,
            )
        }
        [u, v, ..] => {
            if u.header.spec() != v.header.spec() {
                return Err(FlowError::InvalidGrid(format!(
                    "{}: U and V records are on different lattices",
                    name
                )));
            }
            let grid = RegularGrid::new(
                name,
                u.header.date(),
                u.header.spec(),
                GridData::Vector {
                    u: u.values(),
                    v: v.values(),
                },
                scale,
            )?;
            Ok(grid.with_particles(particles))
        }
    }
}

/// Read and parse a grib2json file.
pub fn load_grib2json(
    path: &Path,
    name: &str,
    scale: Arc<dyn ColorScale>,
    particles: ParticleTuning,
) -> FlowResult<RegularGrid> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| FlowError::Io(format!("failed to read {}: {}", path.display(), e)))?;
    parse_grib2json(&json, name, scale, particles)
}

/// A global 1° wind field with mid-latitude jets, tropical easterlies and a
/// wavenumber-3 meander.
pub fn synthetic_wind(
    date: DateTime<Utc>,
    scale: Arc<dyn ColorScale>,
    particles: ParticleTuning,
) -> FlowResult<RegularGrid> {
    let spec = GridSpec::global_one_degree();
    let mut u = Vec::with_capacity(spec.len());
    let mut v = Vec::with_capacity(spec.len());

    for row in 0..spec.ny {
        let lat = spec.la1 - row as f64 * spec.dy;
        let jet = (-((lat.abs() - 45.0) / 12.0).powi(2)).exp();
        let trades = (-(lat / 15.0).powi(2)).exp();
        for col in 0..spec.nx {
            let lon = (spec.lo1 + col as f64 * spec.dx).to_radians();
            u.push((25.0 * jet - 7.0 * trades + 4.0 * jet * (3.0 * lon).cos()) as f32);
            v.push((8.0 * jet * (3.0 * lon).sin()) as f32);
        }
    }

    let grid = RegularGrid::new(
        "synthetic wind",
        date,
        spec,
        GridData::Vector { u, v },
        scale,
    )?;
    Ok(grid.with_particles(particles))
}

/// Load the primary grid and optional overlay grid described by `config`.
#[instrument(skip_all, fields(source = ?config.source, overlay = ?config.overlay))]
pub fn load_grids(config: &GridConfig, styles: &StyleConfig) -> FlowResult<GridPair> {
    let scale = styles.scale(&config.style)?;
    let primary = match &config.source {
        Some(path) => load_grib2json(path, &file_name(path), scale, config.particles)?,
        None => synthetic_wind(Utc::now(), scale, config.particles)?,
    };
    info!(
        points = primary.spec().len(),
        vector = primary.is_vector(),
        date = %primary.date(),
        "Loaded primary grid"
    );

    let Some(path) = &config.overlay else {
        return Ok(GridPair::new(Arc::new(primary)));
    };

    let overlay_scale = styles.scale(&config.overlay_style)?;
    let overlay = load_grib2json(path, &file_name(path), overlay_scale, config.particles)?;
    info!(grid = %path.display(), date = %overlay.date(), "Loaded overlay grid");
    Ok(GridPair::with_overlay(Arc::new(primary), Arc::new(overlay)))
}

fn file_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use flow_common::{GridValue, Rgba};

    struct Flat;

    impl ColorScale for Flat {
        fn gradient(&self, _value: f64, alpha: u8) -> Rgba {
            Rgba::new(1, 2, 3, alpha)
        }

        fn bounds(&self) -> (f64, f64) {
            (0.0, 1.0)
        }
    }

    fn header(name: &str) -> String {
        format!(
            r#"{{"nx": 2, "ny": 2, "lo1": 0.0, "la1": 1.0, "dx": 1.0, "dy": 1.0,
                "refTime": "2014-01-31T00:00:00.000Z", "forecastTime": 3,
                "parameterNumberName": "{}"}}"#,
            name
        )
    }

    #[test]
    fn test_parse_scalar_record() {
        let json = format!(
            r#"[{{"header": {}, "data": [1.0, 2.0, 3.0, 4.0]}}]"#,
            header("Temperature")
        );
        let grid =
            parse_grib2json(&json, "temp", Arc::new(Flat), ParticleTuning::default()).unwrap();

        assert!(!grid.is_vector());
        assert!(grid.particles().is_none());
        assert_eq!(
            grid.date(),
            Utc.with_ymd_and_hms(2014, 1, 31, 3, 0, 0).unwrap()
        );
        match grid.interpolate(0.0, 1.0) {
            Some(GridValue::Scalar(value)) => assert_eq!(value, 1.0),
            other => panic!("expected scalar, got {:?}", other),
        }
    }

    #[test]
    fn test_null_values_are_missing() {
        let json = format!(
            r#"[{{"header": {}, "data": [1.0, 2.0, 3.0, null]}}]"#,
            header("Temperature")
        );
        let grid =
            parse_grib2json(&json, "temp", Arc::new(Flat), ParticleTuning::default()).unwrap();
        assert!(grid.interpolate(0.5, 0.5).is_none());
    }

    #[test]
    fn test_parse_vector_records() {
        let json = format!(
            r#"[{{"header": {u}, "data": [3.0, 3.0, 3.0, 3.0]}},
                {{"header": {v}, "data": [4.0, 4.0, 4.0, 4.0]}}]"#,
            u = header("U-component_of_wind"),
            v = header("V-component_of_wind")
        );
        let grid =
            parse_grib2json(&json, "wind", Arc::new(Flat), ParticleTuning::default()).unwrap();

        assert!(grid.is_vector());
        assert_eq!(grid.particles(), Some(ParticleTuning::default()));
        let wind = grid.interpolate(0.5, 0.5).and_then(|v| v.as_wind()).unwrap();
        assert!((wind.magnitude - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_and_malformed_input() {
        let scale: Arc<dyn ColorScale> = Arc::new(Flat);
        assert!(matches!(
            parse_grib2json("[]", "x", scale.clone(), ParticleTuning::default()),
            Err(FlowError::InvalidGrid(_))
        ));
        assert!(matches!(
            parse_grib2json("{", "x", scale, ParticleTuning::default()),
            Err(FlowError::Json(_))
        ));
    }

    #[test]
    fn test_value_count_must_match_lattice() {
        let json = format!(r#"[{{"header": {}, "data": [1.0]}}]"#, header("T"));
        let result = parse_grib2json(&json, "t", Arc::new(Flat), ParticleTuning::default());
        assert!(matches!(result, Err(FlowError::InvalidGrid(_))));
    }

    #[test]
    fn test_synthetic_wind_has_jets() {
        let grid = synthetic_wind(Utc::now(), Arc::new(Flat), ParticleTuning::default()).unwrap();
        let jet = grid.interpolate(0.0, 45.0).and_then(|v| v.as_wind()).unwrap();
        let tropics = grid.interpolate(90.0, 0.0).and_then(|v| v.as_wind()).unwrap();

        assert!(jet.u > 20.0);
        assert!(tropics.u < 0.0);
    }
}
