use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{WindField, WindRecord};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a wind field from a grib2json document on disk.
pub fn load_file(path: &Path) -> Result<WindField> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Parse a grib2json document.
///
/// Expected layout (`grib2json --names --data --fp wind`):
///
/// ```json
/// [
///   { "header": { "parameterCategory": 2, "parameterNumber": 2, "nx": 360, ... },
///     "data": [ ... ] },
///   { "header": { "parameterCategory": 2, "parameterNumber": 3, "nx": 360, ... },
///     "data": [ ... ] }
/// ]
/// ```
///
/// U and V are located by parameter number; files without parameter
/// numbers are read as U then V.
pub fn parse_str(text: &str) -> Result<WindField> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let items = root
        .as_array()
        .context("Expected top-level JSON array of records")?;

    if items.len() < 2 {
        bail!("Expected U and V records, found {}", items.len());
    }

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let record = WindRecord::deserialize(item)
            .with_context(|| format!("Record {i} is not a grib2json record"))?;
        check_size(&record, i)?;
        records.push(record);
    }

    let u_pos = records.iter().position(|r| r.header.is_u_wind());
    let v_pos = records.iter().position(|r| r.header.is_v_wind());
    let (u_idx, v_idx) = match (u_pos, v_pos) {
        (Some(u), Some(v)) => (u, v),
        (None, None) => {
            log::debug!("No wind parameter numbers, reading records 0 and 1 as U and V");
            (0, 1)
        }
        (Some(_), None) => bail!("Found U-component record but no V-component"),
        (None, Some(_)) => bail!("Found V-component record but no U-component"),
    };

    let v = records.swap_remove(v_idx);
    // swap_remove moved the last element into v_idx
    let u_idx = if u_idx == records.len() { v_idx } else { u_idx };
    let u = records.swap_remove(u_idx);

    if !u.header.same_grid(&v.header) {
        bail!(
            "U grid {}x{} and V grid {}x{} do not match",
            u.header.nx,
            u.header.ny,
            v.header.nx,
            v.header.ny
        );
    }

    Ok(WindField {
        header: u.header,
        u: u.data,
        v: v.data,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_size(record: &WindRecord, i: usize) -> Result<()> {
    let expected = record
        .header
        .nx
        .checked_mul(record.header.ny)
        .with_context(|| format!("Record {i}: grid size overflows"))?;
    if expected == 0 {
        bail!("Record {i}: empty grid {}x{}", record.header.nx, record.header.ny);
    }
    if record.data.len() != expected {
        bail!(
            "Record {i}: header declares {}x{} = {expected} points but data has {}",
            record.header.nx,
            record.header.ny,
            record.data.len()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(number: Option<u32>, nx: usize, ny: usize, data: &[f64]) -> JsonValue {
        let mut header = serde_json::json!({
            "nx": nx, "ny": ny, "lo1": 0.0, "la1": 90.0, "dx": 1.0, "dy": 1.0,
            "refTime": "2024-07-25T00:00:00.000Z"
        });
        if let Some(n) = number {
            header["parameterCategory"] = 2.into();
            header["parameterNumber"] = n.into();
        }
        serde_json::json!({ "header": header, "data": data })
    }

    #[test]
    fn finds_components_by_parameter_number() {
        // V listed before U
        let doc = serde_json::json!([
            record(Some(3), 2, 1, &[7.0, 8.0]),
            record(Some(2), 2, 1, &[1.0, 2.0]),
        ]);
        let field = parse_str(&doc.to_string()).unwrap();
        assert_eq!(field.u, vec![1.0, 2.0]);
        assert_eq!(field.v, vec![7.0, 8.0]);
        assert_eq!(field.reference_time(), Some("2024-07-25T00:00:00.000Z"));
    }

    #[test]
    fn ignores_extra_records() {
        let doc = serde_json::json!([
            record(Some(2), 1, 1, &[1.0]),
            record(None, 1, 1, &[9.0]),
            record(Some(3), 1, 1, &[2.0]),
        ]);
        let field = parse_str(&doc.to_string()).unwrap();
        assert_eq!(field.u, vec![1.0]);
        assert_eq!(field.v, vec![2.0]);
    }

    #[test]
    fn falls_back_to_record_order() {
        let doc = serde_json::json!([
            record(None, 1, 1, &[1.0]),
            record(None, 1, 1, &[2.0]),
        ]);
        let field = parse_str(&doc.to_string()).unwrap();
        assert_eq!(field.u, vec![1.0]);
        assert_eq!(field.v, vec![2.0]);
    }

    #[test]
    fn rejects_size_mismatch() {
        let doc = serde_json::json!([
            record(Some(2), 2, 2, &[1.0, 2.0, 3.0]),
            record(Some(3), 2, 2, &[1.0, 2.0, 3.0, 4.0]),
        ]);
        let err = parse_str(&doc.to_string()).unwrap_err();
        assert!(format!("{err:#}").contains("data has 3"));
    }

    #[test]
    fn rejects_grid_mismatch_and_missing_component() {
        let doc = serde_json::json!([
            record(Some(2), 2, 1, &[1.0, 2.0]),
            record(Some(3), 1, 2, &[1.0, 2.0]),
        ]);
        assert!(parse_str(&doc.to_string()).is_err());

        let doc = serde_json::json!([
            record(Some(2), 1, 1, &[1.0]),
            record(Some(2), 1, 1, &[1.0]),
        ]);
        let err = parse_str(&doc.to_string()).unwrap_err();
        assert!(err.to_string().contains("no V-component"));
    }

    #[test]
    fn rejects_non_array_and_short_documents() {
        assert!(parse_str("{}").is_err());
        assert!(parse_str("not json").is_err());
        let doc = serde_json::json!([record(Some(2), 1, 1, &[1.0])]);
        assert!(parse_str(&doc.to_string()).is_err());
    }

    #[test]
    fn load_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gfs_20240725_00.json");
        std::fs::write(&path, "[]").unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("gfs_20240725_00.json"));

        let doc = serde_json::json!([
            record(Some(2), 1, 1, &[3.0]),
            record(Some(3), 1, 1, &[4.0]),
        ]);
        std::fs::write(&path, doc.to_string()).unwrap();
        let field = load_file(&path).unwrap();
        assert_eq!(field.speed_range(), Some((5.0, 5.0)));
    }
}
