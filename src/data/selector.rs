use std::fmt;

// ---------------------------------------------------------------------------
// DateKey – the YYYYMMDD digits embedded in a dataset filename
// ---------------------------------------------------------------------------

/// Eight ASCII digits taken verbatim from a filename.
///
/// The digits are an opaque sort key: `20241332` is accepted even though
/// month 13 does not exist. Fixed width makes byte order equal to
/// chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey([u8; 8]);

impl DateKey {
    /// The digits as written, e.g. `"20240725"`.
    pub fn as_str(&self) -> &str {
        // Only ever built from ASCII digits.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// The digits as a number, e.g. `20240725`.
    pub fn as_u32(&self) -> u32 {
        self.0
            .iter()
            .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0'))
    }

    pub fn year(&self) -> &str {
        &self.as_str()[..4]
    }

    pub fn month(&self) -> &str {
        &self.as_str()[4..6]
    }

    pub fn day(&self) -> &str {
        &self.as_str()[6..]
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.year(), self.month(), self.day())
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Position of the first eight consecutive ASCII digits in `name`.
fn date_offset(name: &str) -> Option<usize> {
    let bytes = name.as_bytes();
    let mut run = 0;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            run += 1;
            if run == 8 {
                return Some(i + 1 - 8);
            }
        } else {
            run = 0;
        }
    }
    None
}

/// Extract the `YYYYMMDD` key from a filename.
///
/// The leftmost run of eight digits wins; in a longer run such as
/// `2024072500` only the first eight digits are used.
pub fn extract_date_key(name: &str) -> Option<DateKey> {
    let start = date_offset(name)?;
    let mut digits = [0u8; 8];
    digits.copy_from_slice(&name.as_bytes()[start..start + 8]);
    Some(DateKey(digits))
}

/// The model cycle hour in a `gfs_YYYYMMDD_HH` style name, if present.
pub fn cycle_hour(name: &str) -> Option<u8> {
    let start = date_offset(name)?;
    let rest = name.get(start + 8..)?.strip_prefix('_')?;
    let hh = rest.get(..2)?;
    if !hh.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    hh.parse().ok().filter(|h| *h < 24)
}

/// Filename the download pipeline writes for one model cycle.
#[cfg(test)]
pub fn dataset_filename(date: &DateKey, cycle: u8) -> String {
    format!("gfs_{}_{cycle:02}.json", date.as_str())
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Pick the candidate with the most recent embedded date.
///
/// * Undated candidates are never chosen; if nothing is dated the result is
///   `None`.
/// * Equal dates keep the candidate seen first.
/// * The returned reference always points into `candidates`.
pub fn select_latest<S: AsRef<str>>(candidates: &[S]) -> Option<&S> {
    let mut best: Option<(DateKey, &S)> = None;
    for candidate in candidates {
        let Some(key) = extract_date_key(candidate.as_ref()) else {
            continue;
        };
        match best {
            Some((best_key, _)) if key <= best_key => {}
            _ => best = Some((key, candidate)),
        }
    }
    best.map(|(_, candidate)| candidate)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
