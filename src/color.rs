use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColorError {
    #[error("unrecognised colour {0:?}")]
    Unrecognised(String),
    #[error("colour component out of range in {0:?}")]
    OutOfRange(String),
}

// ---------------------------------------------------------------------------
// CSS colour parsing
// ---------------------------------------------------------------------------

/// Parse `rgb(r,g,b)`, `#rrggbb` or a basic CSS colour name.
pub fn parse_css_color(text: &str) -> Result<Color32, ColorError> {
    let s = text.trim();

    if let Some(inner) = s
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        let [r, g, b] = parts.as_slice() else {
            return Err(ColorError::Unrecognised(text.to_string()));
        };
        let channel = |c: &str| -> Result<u8, ColorError> {
            let value: u32 = c
                .parse()
                .map_err(|_| ColorError::Unrecognised(text.to_string()))?;
            u8::try_from(value).map_err(|_| ColorError::OutOfRange(text.to_string()))
        };
        return Ok(Color32::from_rgb(channel(*r)?, channel(*g)?, channel(*b)?));
    }

    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
            return Ok(Color32::from_rgb(byte(0), byte(2), byte(4)));
        }
        return Err(ColorError::Unrecognised(text.to_string()));
    }

    match s.to_ascii_lowercase().as_str() {
        "white" => Ok(Color32::WHITE),
        "black" => Ok(Color32::BLACK),
        "red" => Ok(Color32::from_rgb(255, 0, 0)),
        "green" => Ok(Color32::from_rgb(0, 128, 0)),
        "blue" => Ok(Color32::from_rgb(0, 0, 255)),
        "yellow" => Ok(Color32::from_rgb(255, 255, 0)),
        "purple" => Ok(Color32::from_rgb(128, 0, 128)),
        "orange" => Ok(Color32::from_rgb(255, 165, 0)),
        _ => Err(ColorError::Unrecognised(text.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Velocity colour scale
// ---------------------------------------------------------------------------

/// Generates `n` hues from orange through to blue, slow to fast.
pub fn generate_ramp(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let t = if n == 1 { 0.0 } else { i as f32 / (n - 1) as f32 };
            let hsl = Hsl::new(39.0 + t * 180.0, 0.9, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Maps wind speed onto discrete colour stops between a min and max speed.
#[derive(Debug, Clone)]
pub struct ColorScale {
    stops: Vec<Color32>,
    min: f64,
    max: f64,
}

impl ColorScale {
    /// Build from CSS stops; every stop has `opacity` applied.
    ///
    /// An empty stop list falls back to [`ColorScale::hue_ramp`].
    pub fn from_stops(
        stops: &[String],
        min: f64,
        max: f64,
        opacity: f32,
    ) -> Result<Self, ColorError> {
        if stops.is_empty() {
            return Ok(Self::hue_ramp(8, min, max, opacity));
        }
        let colors = stops
            .iter()
            .map(|s| parse_css_color(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_opacity(colors, min, max, opacity))
    }

    /// A generated `n`-stop scale, see [`generate_ramp`].
    pub fn hue_ramp(n: usize, min: f64, max: f64, opacity: f32) -> Self {
        Self::with_opacity(generate_ramp(n.max(1)), min, max, opacity)
    }

    fn with_opacity(colors: Vec<Color32>, min: f64, max: f64, opacity: f32) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        Self {
            stops: colors.into_iter().map(|c| c.gamma_multiply(opacity)).collect(),
            min,
            max,
        }
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// Index of the stop used for `speed`. Out-of-range speeds clamp.
    pub fn index_for(&self, speed: f64) -> usize {
        let n = self.stops.len();
        if n <= 1 || self.max <= self.min || speed.is_nan() {
            return 0;
        }
        let t = ((speed - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        ((t * (n - 1) as f64).floor() as usize).min(n - 1)
    }

    /// One speed range label and colour per stop.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        let n = self.stops.len();
        let step = if n > 1 {
            (self.max - self.min) / (n - 1) as f64
        } else {
            self.max - self.min
        };
        self.stops
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let lo = self.min + step * i as f64;
                let label = if i + 1 == n {
                    format!("≥ {lo:.1} m/s")
                } else {
                    format!("{lo:.1} – {:.1} m/s", lo + step)
                };
                (label, *c)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_COLOR_SCALE;

    fn default_scale() -> ColorScale {
        let stops: Vec<String> = DEFAULT_COLOR_SCALE.iter().map(|s| s.to_string()).collect();
        ColorScale::from_stops(&stops, 0.0, 6.0, 1.0).unwrap()
    }

    #[test]
    fn parses_css_forms() {
        assert_eq!(
            parse_css_color("rgb(255,165,0)"),
            Ok(Color32::from_rgb(255, 165, 0))
        );
        assert_eq!(
            parse_css_color(" rgb( 0, 102 ,255 ) "),
            Ok(Color32::from_rgb(0, 102, 255))
        );
        assert_eq!(parse_css_color("#00bfff"), Ok(Color32::from_rgb(0, 191, 255)));
        assert_eq!(parse_css_color("Yellow"), Ok(Color32::from_rgb(255, 255, 0)));
    }

    #[test]
    fn rejects_bad_colours() {
        assert!(matches!(
            parse_css_color("rgb(256,0,0)"),
            Err(ColorError::OutOfRange(_))
        ));
        assert!(parse_css_color("rgb(1,2)").is_err());
        assert!(parse_css_color("#12345").is_err());
        assert!(parse_css_color("mauve-ish").is_err());
    }

    #[test]
    fn speeds_clamp_to_scale_ends() {
        let scale = default_scale();
        assert_eq!(scale.stop_count(), 15);
        assert_eq!(scale.index_for(-3.0), 0);
        assert_eq!(scale.index_for(0.0), 0);
        assert_eq!(scale.index_for(3.0), 7);
        assert_eq!(scale.index_for(6.0), 14);
        assert_eq!(scale.index_for(40.0), 14);

        let legend = scale.legend_entries();
        assert_eq!(legend[scale.index_for(0.0)].1, Color32::from_rgb(255, 165, 0));
        assert_eq!(legend[scale.index_for(99.0)].1, Color32::from_rgb(0, 102, 255));
    }

    #[test]
    fn empty_stops_use_generated_ramp() {
        let scale = ColorScale::from_stops(&[], 0.0, 10.0, 1.0).unwrap();
        assert_eq!(scale.stop_count(), 8);
        assert_eq!(scale.legend_entries().len(), 8);
        assert!(ColorScale::from_stops(&["nope".to_string()], 0.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn legend_covers_velocity_range() {
        let entries = default_scale().legend_entries();
        assert_eq!(entries.len(), 15);
        assert!(entries[0].0.starts_with("0.0"));
        assert!(entries[14].0.contains("6.0"));
    }
}
