use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// grib2json records
// ---------------------------------------------------------------------------

/// GRIB2 parameter category for momentum.
pub const CATEGORY_MOMENTUM: u32 = 2;
/// U-component of wind (eastward).
pub const PARAMETER_U_WIND: u32 = 2;
/// V-component of wind (northward).
pub const PARAMETER_V_WIND: u32 = 3;

/// The `header` object of one grib2json record.
///
/// Only the fields the viewer uses are modelled; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordHeader {
    #[serde(default)]
    pub parameter_category: Option<u32>,
    #[serde(default)]
    pub parameter_number: Option<u32>,
    #[serde(default)]
    pub parameter_number_name: Option<String>,
    #[serde(default)]
    pub parameter_unit: Option<String>,
    /// Grid points along a parallel.
    pub nx: usize,
    /// Grid points along a meridian.
    pub ny: usize,
    /// Longitude of the first grid point.
    pub lo1: f64,
    /// Latitude of the first grid point.
    pub la1: f64,
    #[serde(default)]
    pub lo2: Option<f64>,
    #[serde(default)]
    pub la2: Option<f64>,
    /// Longitude increment.
    pub dx: f64,
    /// Latitude increment.
    pub dy: f64,
    /// Model reference time (ISO-8601).
    #[serde(default)]
    pub ref_time: Option<String>,
    /// Forecast offset in hours.
    #[serde(default)]
    pub forecast_time: Option<i64>,
}

impl RecordHeader {
    pub fn is_u_wind(&self) -> bool {
        self.parameter_category == Some(CATEGORY_MOMENTUM)
            && self.parameter_number == Some(PARAMETER_U_WIND)
    }

    pub fn is_v_wind(&self) -> bool {
        self.parameter_category == Some(CATEGORY_MOMENTUM)
            && self.parameter_number == Some(PARAMETER_V_WIND)
    }

    /// Whether two headers describe the same grid.
    pub fn same_grid(&self, other: &RecordHeader) -> bool {
        self.nx == other.nx
            && self.ny == other.ny
            && self.lo1 == other.lo1
            && self.la1 == other.la1
            && self.dx == other.dx
            && self.dy == other.dy
    }
}

/// One grib2json record: a header plus `nx * ny` row-major samples.
///
/// Missing values are written as `null` and read back as `NaN`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindRecord {
    pub header: RecordHeader,
    #[serde(deserialize_with = "nullable_samples")]
    pub data: Vec<f64>,
}

fn nullable_samples<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

// ---------------------------------------------------------------------------
// WindVector – one displayable sample
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindVector {
    pub lon: f64,
    pub lat: f64,
    /// Eastward component, m/s.
    pub u: f64,
    /// Northward component, m/s.
    pub v: f64,
    /// Magnitude, m/s.
    pub speed: f64,
}

// ---------------------------------------------------------------------------
// WindField – paired U/V grids
// ---------------------------------------------------------------------------

/// U and V components on one shared regular lon/lat grid.
///
/// Rows start at `la1` and step south by `dy`; columns start at `lo1` and
/// step east by `dx`.
#[derive(Debug, Clone)]
pub struct WindField {
    pub header: RecordHeader,
    pub u: Vec<f64>,
    pub v: Vec<f64>,
}

impl WindField {
    pub fn nx(&self) -> usize {
        self.header.nx
    }

    pub fn ny(&self) -> usize {
        self.header.ny
    }

    /// Number of grid points.
    pub fn point_count(&self) -> usize {
        self.u.len()
    }

    pub fn lon_at(&self, i: usize) -> f64 {
        self.header.lo1 + i as f64 * self.header.dx
    }

    pub fn lat_at(&self, j: usize) -> f64 {
        self.header.la1 - j as f64 * self.header.dy
    }

    /// The vector at column `i`, row `j`; `None` when out of range or missing.
    pub fn vector_at(&self, i: usize, j: usize) -> Option<WindVector> {
        if i >= self.nx() || j >= self.ny() {
            return None;
        }
        let idx = j * self.nx() + i;
        let (u, v) = (*self.u.get(idx)?, *self.v.get(idx)?);
        if u.is_nan() || v.is_nan() {
            return None;
        }
        Some(WindVector {
            lon: self.lon_at(i),
            lat: self.lat_at(j),
            u,
            v,
            speed: u.hypot(v),
        })
    }

    /// Minimum and maximum wind speed over all non-missing samples.
    pub fn speed_range(&self) -> Option<(f64, f64)> {
        self.u
            .iter()
            .zip(&self.v)
            .filter(|(u, v)| !u.is_nan() && !v.is_nan())
            .map(|(u, v)| u.hypot(*v))
            .fold(None, |acc, s| match acc {
                None => Some((s, s)),
                Some((lo, hi)) => Some((lo.min(s), hi.max(s))),
            })
    }

    pub fn reference_time(&self) -> Option<&str> {
        self.header.ref_time.as_deref()
    }
}

/// A U-wind header on a 1° grid starting at 0°E, 90°N.
#[cfg(test)]
pub(crate) fn test_header(nx: usize, ny: usize) -> RecordHeader {
    RecordHeader {
        parameter_category: Some(CATEGORY_MOMENTUM),
        parameter_number: Some(PARAMETER_U_WIND),
        parameter_number_name: None,
        parameter_unit: None,
        nx,
        ny,
        lo1: 0.0,
        la1: 90.0,
        lo2: None,
        la2: None,
        dx: 1.0,
        dy: 1.0,
        ref_time: Some("2024-07-25T00:00:00.000Z".into()),
        forecast_time: Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_coordinates_step_east_and_south() {
        let field = WindField {
            header: test_header(3, 2),
            u: vec![3.0, 0.0, 1.0, 0.0, 0.0, 0.0],
            v: vec![4.0, 0.0, 1.0, 0.0, 0.0, 0.0],
        };
        assert_eq!(field.point_count(), 6);
        let vec = field.vector_at(0, 0).unwrap();
        assert_eq!((vec.lon, vec.lat), (0.0, 90.0));
        assert_eq!(vec.speed, 5.0);

        let vec = field.vector_at(2, 1).unwrap();
        assert_eq!((vec.lon, vec.lat), (2.0, 89.0));
        assert!(field.vector_at(3, 0).is_none());
        assert!(field.vector_at(0, 2).is_none());
    }

    #[test]
    fn missing_samples_are_skipped() {
        let field = WindField {
            header: test_header(2, 1),
            u: vec![f64::NAN, 6.0],
            v: vec![1.0, 8.0],
        };
        assert!(field.vector_at(0, 0).is_none());
        assert_eq!(field.speed_range(), Some((10.0, 10.0)));
    }

    #[test]
    fn null_data_reads_as_nan() {
        let text = r#"{"header":{"nx":2,"ny":1,"lo1":0,"la1":0,"dx":1,"dy":1},"data":[null,1.5]}"#;
        let record: WindRecord = serde_json::from_str(text).unwrap();
        assert!(record.data[0].is_nan());
        assert_eq!(record.data[1], 1.5);
        assert!(!record.header.is_u_wind());
    }
}
