//! Fix sources: GeoLife `.plt` trajectories and plain `timestamp,lat,lon` CSV.
//!
//! Readers return fixes sorted by timestamp. A missing source or a malformed line surfaces
//! as a `PipelineError` wrapped in `anyhow`, so callers can downcast.

use {
    crate::{domain::RawFix, error::PipelineError},
    anyhow::{Context, Result, bail},
    chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc},
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// Header lines at the top of every `.plt` file.
const PLT_HEADER_LINES: usize = 6;
pub const CSV_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Beijing time (UTC+8), where the GeoLife subjects lived.
pub const GEOLIFE_UTC_OFFSET_SECS: i32 = 8 * 3600;

pub fn geolife_offset() -> FixedOffset {
    FixedOffset::east_opt(GEOLIFE_UTC_OFFSET_SECS).unwrap_or(Utc.fix())
}

/// Reads every `.plt` file in `dir` (one GeoLife user's `Trajectory` folder), converts the
/// UTC timestamps to `offset` local time and merges them into one sorted stream.
pub fn read_geolife_user(dir: &Path, offset: FixedOffset) -> Result<Vec<RawFix>> {
    if !dir.is_dir() {
        bail!(PipelineError::SourceNotFound(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("plt")))
        .collect();
    files.sort();

    let mut fixes = Vec::new();
    for file in &files {
        fixes.extend(read_plt_file(file, offset)?);
    }
    fixes.sort_by_key(|f| f.timestamp);

    log::info!(
        "Loaded {} fixes from {} trajectory files in {}",
        fixes.len(),
        files.len(),
        dir.display()
    );
    Ok(fixes)
}

pub fn read_plt_file(path: &Path, offset: FixedOffset) -> Result<Vec<RawFix>> {
    let raw = read_source(path)?;

    raw.lines()
        .enumerate()
        .skip(PLT_HEADER_LINES)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            parse_plt_line(line, offset).map_err(|reason| {
                anyhow::Error::from(PipelineError::Parse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    reason,
                })
            })
        })
        .collect()
}

/// `lat,lon,0,alt,days,date,time` with date/time in UTC.
fn parse_plt_line(line: &str, offset: FixedOffset) -> Result<RawFix, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 7 {
        return Err(format!("expected 7 fields, found {}", fields.len()));
    }

    let (lat, lon) = parse_coords(fields[0], fields[1])?;
    let date = NaiveDate::parse_from_str(fields[5], "%Y-%m-%d")
        .map_err(|e| format!("bad date '{}': {e}", fields[5]))?;
    let time = NaiveTime::parse_from_str(fields[6], "%H:%M:%S")
        .map_err(|e| format!("bad time '{}': {e}", fields[6]))?;

    let utc = Utc.from_utc_datetime(&date.and_time(time));
    Ok(RawFix::new(utc.with_timezone(&offset).naive_local(), lat, lon))
}

/// Reads `timestamp,lat,lon` rows. An optional header row starting with `timestamp` is
/// skipped. Timestamps are RFC 3339 (kept as local wall time) or `%Y-%m-%d %H:%M:%S`.
pub fn read_csv_fixes(path: &Path) -> Result<Vec<RawFix>> {
    let raw = read_source(path)?;

    let mut fixes = raw
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter(|(i, line)| !(*i == 0 && line.trim_start().starts_with("timestamp")))
        .map(|(i, line)| {
            parse_csv_line(line).map_err(|reason| {
                anyhow::Error::from(PipelineError::Parse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    reason,
                })
            })
        })
        .collect::<Result<Vec<RawFix>>>()?;
    fixes.sort_by_key(|f| f.timestamp);

    log::info!("Loaded {} fixes from {}", fixes.len(), path.display());
    Ok(fixes)
}

fn parse_csv_line(line: &str) -> Result<RawFix, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [ts, lat, lon] = fields.as_slice() else {
        return Err(format!("expected 3 fields, found {}", fields.len()));
    };

    let timestamp = parse_timestamp(ts)?;
    let (lat, lon) = parse_coords(lat, lon)?;
    Ok(RawFix::new(timestamp, lat, lon))
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(s, CSV_TIME_FORMAT))
        .map_err(|e| format!("bad timestamp '{s}': {e}"))
}

fn parse_coords(lat: &str, lon: &str) -> Result<(f64, f64), String> {
    let lat: f64 = lat.parse().map_err(|e| format!("bad latitude '{lat}': {e}"))?;
    let lon: f64 = lon.parse().map_err(|e| format!("bad longitude '{lon}': {e}"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("coordinates out of range: {lat}, {lon}"));
    }
    Ok((lat, lon))
}

fn read_source(path: &Path) -> Result<String> {
    if !path.exists() {
        bail!(PipelineError::SourceNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// `(user id, Trajectory dir)` for every user folder under a GeoLife `Data` root,
/// sorted by user id.
pub fn list_geolife_users(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !root.is_dir() {
        bail!(PipelineError::SourceNotFound(root.to_path_buf()));
    }

    let mut users: Vec<(String, PathBuf)> = fs::read_dir(root)
        .with_context(|| format!("Failed to list {}", root.display()))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let trajectory = entry.path().join("Trajectory");
            trajectory
                .is_dir()
                .then(|| (entry.file_name().to_string_lossy().into_owned(), trajectory))
        })
        .collect();
    users.sort();
    Ok(users)
}
