//! Stay-point detection over an ordered fix stream.
//!
//! A window starts at an anchor fix and grows while each new fix stays within
//! `distance_threshold` of that anchor. The first fix outside the radius closes the window:
//! it becomes a stay point if it lasted at least `time_threshold`, and is dropped otherwise.
//! Either way the outlying fix anchors the next window. The last window of the stream gets
//! the same test.
//!
//! The radius bounds every member against the anchor, not against the emitted centroid. The
//! centroid lies within the radius of the anchor, so a member is at most twice the radius
//! from it.

use {
    crate::{
        config::DetectorConfig,
        domain::{RawFix, StayPoint, centroid, haversine_m},
        error::{PipelineError, PipelineResult},
        utils::to_time_delta,
    },
    chrono::TimeDelta,
    std::iter::FusedIterator,
};

#[derive(Debug, Clone)]
pub struct StayPointDetector {
    distance_threshold_m: f64,
    time_threshold: TimeDelta,
    max_fix_gap: Option<TimeDelta>,
}

impl StayPointDetector {
    pub fn new(config: DetectorConfig) -> PipelineResult<Self> {
        config.validate()?;

        log::debug!(
            "Initialized StayPointDetector: distance threshold {}, time threshold {:?}, fix gap {:?}",
            config.distance_threshold,
            config.time_threshold,
            config.max_fix_gap
        );

        Ok(Self {
            distance_threshold_m: config.distance_threshold.value(),
            time_threshold: to_time_delta(config.time_threshold),
            max_fix_gap: config.max_fix_gap.map(to_time_delta),
        })
    }

    /// Validates ordering, then returns a lazy iterator of stay points ordered by arrival.
    /// Out-of-order fixes are rejected, never re-sorted.
    pub fn detect<'a>(&self, fixes: &'a [RawFix]) -> PipelineResult<StayPoints<'a>> {
        if let Some(index) = (1..fixes.len()).find(|&i| fixes[i].timestamp < fixes[i - 1].timestamp)
        {
            let err = PipelineError::InputOrdering {
                index,
                previous: fixes[index - 1].timestamp,
                current: fixes[index].timestamp,
            };
            log::error!("Stay point detection aborted: {}", err);
            return Err(err);
        }

        Ok(StayPoints {
            fixes,
            cursor: 0,
            distance_threshold_m: self.distance_threshold_m,
            time_threshold: self.time_threshold,
            max_fix_gap: self.max_fix_gap,
        })
    }
}

/// Lazy stay-point sequence produced by [`StayPointDetector::detect`].
pub struct StayPoints<'a> {
    fixes: &'a [RawFix],
    cursor: usize,
    distance_threshold_m: f64,
    time_threshold: TimeDelta,
    max_fix_gap: Option<TimeDelta>,
}

impl StayPoints<'_> {
    /// End (exclusive) of the window anchored at `start`.
    fn window_end(&self, start: usize) -> usize {
        let anchor = &self.fixes[start].point;
        let mut end = start + 1;

        while end < self.fixes.len() {
            let fix = &self.fixes[end];

            if let Some(max_gap) = self.max_fix_gap {
                if fix.timestamp - self.fixes[end - 1].timestamp > max_gap {
                    break;
                }
            }

            if haversine_m(anchor, &fix.point) > self.distance_threshold_m {
                break;
            }
            end += 1;
        }

        end
    }

    fn evaluate(&self, window: &[RawFix]) -> Option<StayPoint> {
        let (first, last) = (window.first()?, window.last()?);
        if last.timestamp - first.timestamp < self.time_threshold {
            return None;
        }

        Some(StayPoint {
            arrival: first.timestamp,
            departure: last.timestamp,
            centroid: centroid(window.iter().map(|f| &f.point))?,
            fix_count: window.len(),
        })
    }
}

impl Iterator for StayPoints<'_> {
    type Item = StayPoint;

    fn next(&mut self) -> Option<StayPoint> {
        while self.cursor < self.fixes.len() {
            let start = self.cursor;
            let end = self.window_end(start);
            self.cursor = end;

            if let Some(stay_point) = self.evaluate(&self.fixes[start..end]) {
                return Some(stay_point);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.fixes.len() - self.cursor))
    }
}

impl FusedIterator for StayPoints<'_> {}
