use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};

const START_DATE: Date = (2024, 7, 16);
const INTERVALS: [&str; 4] = ["00", "06", "12", "18"];
const HEAD_ATTEMPTS: usize = 2;

const BASE_URL: &str = "https://nomads.ncep.noaa.gov/cgi-bin/filter_gfs_1p00.pl";
const LEV: &str = "lev_10_m_above_ground=on";
const LEFTLON: &str = "0";
const RIGHTLON: &str = "360";
const TOPLAT: &str = "90";
const BOTTOMLAT: &str = "-90";

const GRIB2JSON_ENV: &str = "GRIB2JSON";
const LAST_RUN_FILE: &str = "last_run.txt";
const LOG_FILE: &str = "download_log.txt";
const GFS_DIR: &str = "gfs";
const JSON_DIR: &str = "json";

type Date = (u32, u32, u32);

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        _ => 28,
    }
}

fn increment_date((y, m, d): Date) -> Date {
    if d < days_in_month(y, m) {
        (y, m, d + 1)
    } else if m < 12 {
        (y, m + 1, 1)
    } else {
        (y + 1, 1, 1)
    }
}

/// `YYYYMMDD`
fn format_date((y, m, d): Date) -> String {
    format!("{y:04}{m:02}{d:02}")
}

fn parse_date(text: &str) -> Option<Date> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let y = text[..4].parse().ok()?;
    let m = text[4..6].parse().ok()?;
    let d = text[6..].parse().ok()?;
    let valid = (1..=12).contains(&m) && (1..=days_in_month(y, m)).contains(&d);
    valid.then_some((y, m, d))
}

/// Civil date of a day count since 1970-01-01.
fn date_from_unix_days(days: i64) -> Date {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = yoe + era * 400 + i64::from(m <= 2);
    (y as u32, m as u32, d as u32)
}

fn utc_today() -> Result<Date> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before 1970")?
        .as_secs();
    Ok(date_from_unix_days((secs / 86_400) as i64))
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

fn filter_url(date: Date, cycle: &str) -> String {
    format!(
        "{BASE_URL}?file=gfs.t{cycle}z.pgrb2.1p00.f000&{LEV}&leftlon={LEFTLON}&rightlon={RIGHTLON}&\
         toplat={TOPLAT}&bottomlat={BOTTOMLAT}&dir=%2Fgfs.{}%2F{cycle}%2Fatmos",
        format_date(date)
    )
}

fn grib_name(date: Date, cycle: &str) -> String {
    format!("gfs_{}_{cycle}.pgrb2.1p00.f000", format_date(date))
}

fn json_name(date: Date, cycle: &str) -> String {
    format!("gfs_{}_{cycle}.json", format_date(date))
}

// ---------------------------------------------------------------------------
// Resume state
// ---------------------------------------------------------------------------

/// Last cycle that was fetched, stored as `YYYYMMDD HH`.
#[derive(Debug, Clone, PartialEq)]
struct LastRun {
    date: Date,
    cycle: String,
}

impl LastRun {
    fn parse(text: &str) -> Option<LastRun> {
        let mut parts = text.split_whitespace();
        let date = parse_date(parts.next()?)?;
        let cycle = parts.next()?;
        if parts.next().is_some() || !INTERVALS.contains(&cycle) {
            return None;
        }
        Some(LastRun {
            date,
            cycle: cycle.to_string(),
        })
    }

    /// Read the resume file; a missing file starts from the beginning.
    fn read(path: &Path) -> Result<LastRun> {
        let start = LastRun {
            date: START_DATE,
            cycle: INTERVALS[0].to_string(),
        };
        if !path.exists() {
            return Ok(start);
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        match LastRun::parse(&text) {
            Some(run) => Ok(run),
            None => {
                log::warn!(
                    "Ignoring malformed {} ({:?}), starting from {}",
                    path.display(),
                    text.trim(),
                    format_date(START_DATE)
                );
                Ok(start)
            }
        }
    }

    fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, format!("{} {}", format_date(self.date), self.cycle))
            .with_context(|| format!("writing {}", path.display()))
    }
}

fn log_download(path: &Path, date: Date, cycle: &str, file: &Path) -> Result<()> {
    let mut log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    writeln!(log, "{} {cycle} {}", format_date(date), file.display())
        .with_context(|| format!("appending to {}", path.display()))
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

struct Fetcher {
    client: reqwest::blocking::Client,
    work_dir: PathBuf,
    grib2json: PathBuf,
}

impl Fetcher {
    /// Whether the filter service has the file, retried up to `HEAD_ATTEMPTS`.
    fn available(&self, url: &str) -> bool {
        for attempt in 1..=HEAD_ATTEMPTS {
            match self.client.head(url).send() {
                Ok(resp) if resp.status() == reqwest::StatusCode::OK => return true,
                Ok(resp) => log::debug!("HEAD attempt {attempt}: {}", resp.status()),
                Err(e) => log::debug!("HEAD attempt {attempt}: {e}"),
            }
        }
        false
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let bytes = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.bytes())
            .with_context(|| format!("downloading {url}"))?;

        let partial = dest.with_extension("part");
        std::fs::write(&partial, &bytes)
            .with_context(|| format!("writing {}", partial.display()))?;
        std::fs::rename(&partial, dest)
            .with_context(|| format!("renaming {} to {}", partial.display(), dest.display()))
    }

    fn convert(&self, grib: &Path, json: &Path) -> Result<()> {
        let status = Command::new(&self.grib2json)
            .args(["--names", "--data", "--fp", "wind", "--fs", "103", "--fv", "10.0", "-o"])
            .arg(json)
            .arg(grib)
            .status()
            .with_context(|| format!("running {}", self.grib2json.display()))?;
        if !status.success() {
            bail!("{} exited with {status} for {}", self.grib2json.display(), grib.display());
        }
        Ok(())
    }

    /// Fetch and convert one cycle. Returns whether the service had data.
    fn fetch_cycle(&self, date: Date, cycle: &str) -> Result<bool> {
        let url = filter_url(date, cycle);
        let grib = self.work_dir.join(GFS_DIR).join(grib_name(date, cycle));
        let json = self.work_dir.join(JSON_DIR).join(json_name(date, cycle));

        log::info!("Fetching {url}");
        if !self.available(&url) {
            log::info!(
                "No data for {} {cycle}z after {HEAD_ATTEMPTS} attempts",
                format_date(date)
            );
            return Ok(false);
        }

        if grib.exists() {
            log::info!("{} already exists, skipping download", grib.display());
        } else {
            self.download(&url, &grib)?;
            log_download(&self.work_dir.join(LOG_FILE), date, cycle, &grib)?;
        }

        if json.exists() {
            log::info!("{} already exists, skipping conversion", json.display());
        } else {
            self.convert(&grib, &json)?;
            log::info!("Converted {} to {}", grib.display(), json.display());
        }

        LastRun {
            date,
            cycle: cycle.to_string(),
        }
        .write(&self.work_dir.join(LAST_RUN_FILE))?;
        Ok(true)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let work_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    for dir in [GFS_DIR, JSON_DIR] {
        let path = work_dir.join(dir);
        std::fs::create_dir_all(&path)
            .with_context(|| format!("creating {}", path.display()))?;
    }

    let grib2json = std::env::var_os(GRIB2JSON_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("grib2json"));
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .context("building HTTP client")?;
    let fetcher = Fetcher {
        client,
        work_dir,
        grib2json,
    };

    let last = LastRun::read(&fetcher.work_dir.join(LAST_RUN_FILE))?;
    let today = utc_today()?;
    log::info!(
        "Resuming from {} {}z, stopping before {}",
        format_date(last.date),
        last.cycle,
        format_date(today)
    );

    // Existing files are skipped, so the last run's day is walked again in full.
    let mut date = last.date;
    while date < today {
        let mut any = false;
        for cycle in INTERVALS {
            any |= fetcher.fetch_cycle(date, cycle)?;
        }
        if !any {
            log::warn!("No data for any cycle on {}", format_date(date));
        }
        date = increment_date(date);
    }
    Ok(())
}
