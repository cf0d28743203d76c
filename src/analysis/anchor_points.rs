//! Home (bed-down) and work candidacy from visit timing.
//!
//! Sparse coverage uses a permissive test on arrival/departure hours; dense coverage requires
//! the stay to overlap the night's (or the day's) window by more than `min_hours`.

use {
    crate::{
        config::{AnchorConfig, Coverage, SleepConfig, TimeWindow, WorkConfig},
        domain::{GeoPoint, Location, LocationId, StayPoint},
        utils::fractional_hours,
    },
    chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike},
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

/// Aggregated qualifying visits of one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorCandidate {
    pub location_id: LocationId,
    pub centroid: GeoPoint,
    pub visit_count: usize,
    /// Qualifying hours: full dwell for sparse coverage, window overlap for dense.
    pub total_hours: f64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

impl AnchorCandidate {
    pub fn avg_hours(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.total_hours / self.visit_count as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoints {
    pub home: Vec<AnchorCandidate>,
    pub work: Vec<AnchorCandidate>,
}

impl AnchorPoints {
    pub fn is_home(&self, id: LocationId) -> bool {
        self.home.iter().any(|c| c.location_id == id)
    }

    pub fn is_work(&self, id: LocationId) -> bool {
        self.work.iter().any(|c| c.location_id == id)
    }
}

pub fn find_anchors(locations: &[Location], config: &AnchorConfig) -> AnchorPoints {
    let home = identify_home(locations, &config.sleep);

    let excluded: Vec<LocationId> = if config.exclude_home_from_work {
        home.iter().map(|c| c.location_id).collect()
    } else {
        Vec::new()
    };
    let work = identify_work(locations, &config.work, &excluded);

    log::info!(
        "Anchor search found {} home and {} work candidates.",
        home.len(),
        work.len()
    );
    AnchorPoints { home, work }
}

pub fn identify_home(locations: &[Location], config: &SleepConfig) -> Vec<AnchorCandidate> {
    let min = hours(config.min_hours);

    let candidates = fold_candidates(locations, |sp| match config.coverage {
        Coverage::Sparse => {
            let long_enough = sp.duration() >= min;
            let overnight = sp.arrival.date() != sp.departure.date();
            let late_arrival = sp.arrival.hour() >= config.window.start_hour;
            let early_departure = sp.departure.hour() <= config.window.end_hour;

            (overnight || (long_enough && (late_arrival || early_departure)))
                .then(|| sp.duration())
        }
        Coverage::Dense => {
            let (start, end) = night_window(sp.arrival, &config.window);
            overlap(sp, start, end).filter(|o| *o > min)
        }
    });

    if candidates.is_empty() {
        log::warn!(
            "No home candidates with {} coverage. Check the sleep window against overnight data.",
            config.coverage
        );
    }
    candidates
}

pub fn identify_work(
    locations: &[Location],
    config: &WorkConfig,
    excluded: &[LocationId],
) -> Vec<AnchorCandidate> {
    let min = hours(config.min_hours);
    let window = config.window;

    let eligible: Vec<&Location> = locations
        .iter()
        .filter(|loc| !excluded.contains(&loc.id()))
        .collect();

    let candidates = fold_candidates(eligible, |sp| {
        let weekday = sp.arrival.weekday().num_days_from_monday() as usize;
        if !config.work_days[weekday] {
            return None;
        }

        match config.coverage {
            Coverage::Sparse => {
                let arrival_hour = sp.arrival.hour();
                let departure_hour = sp.departure.hour();
                let in_window = (window.start_hour..window.end_hour).contains(&arrival_hour)
                    || (departure_hour > window.start_hour && departure_hour <= window.end_hour);
                let same_day = sp.arrival.date() == sp.departure.date();

                (in_window && same_day && sp.duration() >= min).then(|| sp.duration())
            }
            Coverage::Dense => {
                let day = sp.arrival.date();
                let start = at_hour(day, window.start_hour);
                let end = at_hour(day, window.end_hour);
                overlap(sp, start, end).filter(|o| *o > min)
            }
        }
    });

    if candidates.is_empty() {
        log::warn!(
            "No work candidates with {} coverage. Settings may be too restrictive.",
            config.coverage
        );
    }
    candidates
}

/// Runs `qualify` over every visit (arrival order across locations) and folds the qualifying
/// ones per location. Ranked by visit count, then hours, then id.
fn fold_candidates<'a>(
    locations: impl IntoIterator<Item = &'a Location>,
    qualify: impl Fn(&StayPoint) -> Option<TimeDelta>,
) -> Vec<AnchorCandidate> {
    let mut visits: Vec<(&Location, &StayPoint)> = locations
        .into_iter()
        .flat_map(|loc| loc.visits().iter().map(move |sp| (loc, sp)))
        .collect();
    visits.sort_by_key(|(_, sp)| sp.arrival);

    let mut by_location: BTreeMap<LocationId, AnchorCandidate> = BTreeMap::new();
    for (loc, sp) in visits {
        let Some(qualifying) = qualify(sp) else {
            continue;
        };
        let date = sp.arrival.date();
        let entry = by_location
            .entry(loc.id())
            .or_insert_with(|| AnchorCandidate {
                location_id: loc.id(),
                centroid: loc.centroid(),
                visit_count: 0,
                total_hours: 0.0,
                first_date: date,
                last_date: date,
            });
        entry.visit_count += 1;
        entry.total_hours += fractional_hours(qualifying);
        entry.last_date = date;
    }

    let mut ranked: Vec<AnchorCandidate> = by_location.into_values().collect();
    ranked.sort_by(|a, b| {
        b.visit_count
            .cmp(&a.visit_count)
            .then(b.total_hours.total_cmp(&a.total_hours))
            .then(a.location_id.cmp(&b.location_id))
    });
    ranked
}

fn hours(h: f64) -> TimeDelta {
    TimeDelta::seconds((h * 3600.0).round() as i64)
}

fn at_hour(day: NaiveDate, hour: u32) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN) + TimeDelta::hours(hour as i64)
}

/// The sleep window a stay arriving at `arrival` belongs to. For a wrapping window an
/// arrival in the small hours belongs to the night that started the day before.
fn night_window(arrival: NaiveDateTime, window: &TimeWindow) -> (NaiveDateTime, NaiveDateTime) {
    let day = arrival.date();
    if !window.wraps_midnight() {
        return (at_hour(day, window.start_hour), at_hour(day, window.end_hour));
    }

    let start_day = if arrival.hour() <= window.end_hour {
        day.pred_opt().unwrap_or(day)
    } else {
        day
    };
    let end_day = start_day.succ_opt().unwrap_or(start_day);
    (at_hour(start_day, window.start_hour), at_hour(end_day, window.end_hour))
}

fn overlap(sp: &StayPoint, start: NaiveDateTime, end: NaiveDateTime) -> Option<TimeDelta> {
    if sp.departure < start || sp.arrival > end {
        return None;
    }
    Some(sp.departure.min(end) - sp.arrival.max(start))
}
