use super::model::{WindField, WindVector};

// ---------------------------------------------------------------------------
// Region: lon/lat window of the plot
// ---------------------------------------------------------------------------

/// A lon/lat window. Longitudes are compared in `[-180, 180)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Region {
    pub const WORLD: Region = Region {
        min_lon: -180.0,
        max_lon: 180.0,
        min_lat: -90.0,
        max_lat: 90.0,
    };

    /// Window centred on `[lon, lat]` at a web-map zoom level.
    ///
    /// Zoom 0 shows the whole world; each level halves the span. A window
    /// that would cross the poles or the antimeridian is shifted back inside.
    pub fn around(center: [f64; 2], zoom: f64) -> Region {
        let scale = 2f64.powf(zoom.max(0.0));
        let (min_lon, max_lon) = window(center[0], 180.0 / scale, -180.0, 180.0);
        let (min_lat, max_lat) = window(center[1], 90.0 / scale, -90.0, 90.0);
        Region {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let lon = normalize_lon(lon);
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

fn window(center: f64, half: f64, lo: f64, hi: f64) -> (f64, f64) {
    let half = half.min((hi - lo) / 2.0);
    let center = center.clamp(lo + half, hi - half);
    (center - half, center + half)
}

/// Wrap a longitude into `[-180, 180)`. GFS grids run `0..360`.
pub fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Every `stride`-th grid point inside `region`, missing samples excluded.
///
/// Returned longitudes are normalised into `[-180, 180)`.
pub fn sample_vectors(field: &WindField, region: &Region, stride: usize) -> Vec<WindVector> {
    let stride = stride.max(1);
    let mut out = Vec::new();
    for j in (0..field.ny()).step_by(stride) {
        for i in (0..field.nx()).step_by(stride) {
            let Some(mut vector) = field.vector_at(i, j) else {
                continue;
            };
            if !region.contains(vector.lon, vector.lat) {
                continue;
            }
            vector.lon = normalize_lon(vector.lon);
            out.push(vector);
        }
    }
    out
}

/// Smallest stride for which `region` holds at most about `paths` vectors.
pub fn stride_for_paths(field: &WindField, region: &Region, paths: usize) -> usize {
    let paths = paths.max(1);
    let cols = (0..field.nx())
        .filter(|&i| {
            let lon = normalize_lon(field.lon_at(i));
            lon >= region.min_lon && lon <= region.max_lon
        })
        .count();
    let rows = (0..field.ny())
        .filter(|&j| {
            let lat = field.lat_at(j);
            lat >= region.min_lat && lat <= region.max_lat
        })
        .count();

    let mut stride = 1;
    while cols.div_ceil(stride) * rows.div_ceil(stride) > paths {
        stride += 1;
    }
    stride
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::test_header;

    fn calm_field(nx: usize, ny: usize) -> WindField {
        WindField {
            header: test_header(nx, ny),
            u: vec![1.0; nx * ny],
            v: vec![0.0; nx * ny],
        }
    }

    #[test]
    fn longitudes_wrap_into_signed_range() {
        assert_eq!(normalize_lon(0.0), 0.0);
        assert_eq!(normalize_lon(190.0), -170.0);
        assert_eq!(normalize_lon(359.0), -1.0);
        assert_eq!(normalize_lon(-180.0), -180.0);
        assert_eq!(normalize_lon(180.0), -180.0);
    }

    #[test]
    fn stride_thins_grid() {
        let field = calm_field(10, 10);
        assert_eq!(sample_vectors(&field, &Region::WORLD, 1).len(), 100);
        assert_eq!(sample_vectors(&field, &Region::WORLD, 0).len(), 100);
        assert_eq!(sample_vectors(&field, &Region::WORLD, 3).len(), 16);
    }

    #[test]
    fn region_limits_samples() {
        // 0..9°E, 90..81°N
        let field = calm_field(10, 10);
        let region = Region {
            min_lon: 2.0,
            max_lon: 4.0,
            min_lat: 85.0,
            max_lat: 90.0,
        };
        let vectors = sample_vectors(&field, &region, 1);
        assert_eq!(vectors.len(), 3 * 6);
        assert!(vectors.iter().all(|v| region.contains(v.lon, v.lat)));
    }

    #[test]
    fn stride_for_paths_bounds_vector_count() {
        let field = calm_field(360, 181);
        let stride = stride_for_paths(&field, &Region::WORLD, 7000);
        assert_eq!(stride, 4);
        assert!(sample_vectors(&field, &Region::WORLD, stride).len() <= 7000);
        assert!(sample_vectors(&field, &Region::WORLD, stride - 1).len() > 7000);
        assert_eq!(stride_for_paths(&calm_field(4, 4), &Region::WORLD, 7000), 1);

        // a small window keeps full resolution
        let window = Region::around([69.3451, 30.3753], 4.5);
        assert_eq!(stride_for_paths(&field, &window, 7000), 1);
    }

    #[test]
    fn region_around_center() {
        let region = Region::around([69.3451, 30.3753], 0.0);
        assert_eq!(region, Region::WORLD);

        let region = Region::around([69.3451, 30.3753], 2.0);
        assert!((region.max_lon - region.min_lon - 90.0).abs() < 1e-9);
        assert!(region.contains(69.0, 30.0));
        assert!(!region.contains(-100.0, 30.0));
    }
}
