use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::json;

const START_DATE: (u32, u32, u32) = (2024, 7, 23);
const DAYS: usize = 3;
const INTERVALS: [u32; 2] = [0, 12];

// 1° global grid, 0..359°E, 90°N..90°S
const NX: usize = 360;
const NY: usize = 181;

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        _ => 28,
    }
}

fn increment_date((y, m, d): (u32, u32, u32)) -> (u32, u32, u32) {
    if d < days_in_month(y, m) {
        (y, m, d + 1)
    } else if m < 12 {
        (y, m + 1, 1)
    } else {
        (y + 1, 1, 1)
    }
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform in `[-1, 1)`.
    fn next_signed(&mut self) -> f64 {
        ((self.next_u64() >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
    }
}

/// Zonal jets plus one drifting cyclone, in m/s.
fn wind_at(lon: f64, lat: f64, phase: f64, rng: &mut SimpleRng) -> (f64, f64) {
    let lat_r = lat.to_radians();
    let mut u = 8.0 * (3.0 * lat_r).sin() * lat_r.cos();
    let mut v = 2.0 * (2.0 * lon.to_radians() + phase).sin() * lat_r.cos();

    let (clon, clat) = (69.0 + phase * 10.0, 25.0);
    let (dx, dy) = (lon - clon, lat - clat);
    let r2 = dx * dx + dy * dy;
    let strength = 12.0 * (-r2 / 50.0).exp();
    u += -dy * strength / 7.0;
    v += dx * strength / 7.0;

    (u + 0.3 * rng.next_signed(), v + 0.3 * rng.next_signed())
}

fn record(number: u32, name: &str, ref_time: &str, data: &[f64]) -> serde_json::Value {
    json!({
        "header": {
            "discipline": 0,
            "parameterCategory": 2,
            "parameterNumber": number,
            "parameterNumberName": name,
            "parameterUnit": "m.s-1",
            "surface1Type": 103,
            "surface1Value": 10.0,
            "nx": NX,
            "ny": NY,
            "lo1": 0.0,
            "la1": 90.0,
            "lo2": 359.0,
            "la2": -90.0,
            "dx": 1.0,
            "dy": 1.0,
            "refTime": ref_time,
            "forecastTime": 0
        },
        "data": data
    })
}

fn main() -> Result<()> {
    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("json"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let mut date = START_DATE;
    let mut written = 0;

    for day in 0..DAYS {
        for (k, &hour) in INTERVALS.iter().enumerate() {
            let phase = day as f64 + k as f64 * 0.5;
            let mut u = Vec::with_capacity(NX * NY);
            let mut v = Vec::with_capacity(NX * NY);
            for j in 0..NY {
                let lat = 90.0 - j as f64;
                for i in 0..NX {
                    let lon = i as f64;
                    let (ui, vi) = wind_at(lon, lat, phase, &mut rng);
                    u.push((ui * 100.0).round() / 100.0);
                    v.push((vi * 100.0).round() / 100.0);
                }
            }

            let (y, m, d) = date;
            let ref_time = format!("{y:04}-{m:02}-{d:02}T{hour:02}:00:00.000Z");
            let doc = json!([
                record(2, "U-component_of_wind", &ref_time, &u),
                record(3, "V-component_of_wind", &ref_time, &v),
            ]);

            let name = format!("gfs_{y:04}{m:02}{d:02}_{hour:02}.json");
            let path = out_dir.join(&name);
            std::fs::write(&path, doc.to_string())
                .with_context(|| format!("writing {}", path.display()))?;
            written += 1;
        }
        date = increment_date(date);
    }

    println!(
        "Wrote {written} datasets ({NX}x{NY} grid each) to {}",
        out_dir.display()
    );
    Ok(())
}
