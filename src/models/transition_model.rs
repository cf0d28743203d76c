//! First-order Markov chain over visited locations.

use {
    crate::domain::LocationId,
    chrono::{NaiveDateTime, TimeDelta},
    itertools::Itertools,
    serde::{Deserialize, Serialize},
    std::fmt::Write as _,
};

/// One stay at a location, as fed to [`TransitionModel::fit_visits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitEvent {
    pub location_id: LocationId,
    pub arrival: NaiveDateTime,
    pub departure: NaiveDateTime,
}

/// Transition counts and row-normalised probabilities between observed states.
///
/// `states` is sorted ascending and indexes both matrices. A state that was never departed
/// from has no probability row: no prediction is available for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionModel {
    states: Vec<LocationId>,
    counts: Vec<Vec<u32>>,
    probabilities: Vec<Option<Vec<f64>>>,
    /// Occurrences of each state in the training sequence.
    occurrences: Vec<usize>,
}

impl TransitionModel {
    /// Counts every consecutive pair of `sequence`.
    pub fn fit(sequence: &[LocationId]) -> Self {
        let mut model = Self::with_states(sequence.iter().copied());
        for (&from, &to) in sequence.iter().tuple_windows() {
            model.record(from, to);
        }
        model.normalise();
        model
    }

    /// Like [`fit`](Self::fit), but skips pairs whose idle time (next arrival minus current
    /// departure) exceeds `max_gap`. Skipped pairs still contribute their states.
    pub fn fit_visits(visits: &[VisitEvent], max_gap: Option<TimeDelta>) -> Self {
        let mut model = Self::with_states(visits.iter().map(|v| v.location_id));
        let mut skipped = 0usize;

        for (current, next) in visits.iter().tuple_windows() {
            let idle = next.arrival - current.departure;
            if max_gap.is_some_and(|gap| idle > gap) {
                skipped += 1;
                continue;
            }
            model.record(current.location_id, next.location_id);
        }

        if skipped > 0 {
            log::info!("Skipped {} transitions exceeding the idle gap limit.", skipped);
        }
        model.normalise();
        model
    }

    fn with_states(sequence: impl Iterator<Item = LocationId>) -> Self {
        let occurrence_map = sequence.counts();
        let states: Vec<LocationId> = occurrence_map.keys().copied().sorted().collect();
        let occurrences = states.iter().map(|s| occurrence_map[s]).collect();
        let n = states.len();

        Self {
            states,
            counts: vec![vec![0; n]; n],
            probabilities: vec![None; n],
            occurrences,
        }
    }

    fn record(&mut self, from: LocationId, to: LocationId) {
        if let (Some(i), Some(j)) = (self.index_of(from), self.index_of(to)) {
            self.counts[i][j] += 1;
        }
    }

    fn normalise(&mut self) {
        self.probabilities = self
            .counts
            .iter()
            .map(|row| {
                let total: u32 = row.iter().sum();
                (total > 0).then(|| row.iter().map(|&c| c as f64 / total as f64).collect())
            })
            .collect();
    }

    pub fn index_of(&self, state: LocationId) -> Option<usize> {
        self.states.binary_search(&state).ok()
    }

    pub fn states(&self) -> &[LocationId] {
        &self.states
    }

    pub fn counts(&self) -> &[Vec<u32>] {
        &self.counts
    }

    /// Probability row of `state`, None when unknown or never departed from.
    pub fn row(&self, state: LocationId) -> Option<&[f64]> {
        self.index_of(state)
            .and_then(|i| self.probabilities[i].as_deref())
    }

    pub fn probability(&self, from: LocationId, to: LocationId) -> Option<f64> {
        let row = self.row(from)?;
        self.index_of(to).map(|j| row[j])
    }

    pub fn transition_count(&self) -> u32 {
        self.counts.iter().flatten().sum()
    }

    /// Positive-probability successors, most likely first; ties go to the lower id.
    /// Empty for an unknown state or one with no departures.
    pub fn predict(&self, current: LocationId) -> Vec<(LocationId, f64)> {
        let Some(row) = self.row(current) else {
            return Vec::new();
        };

        self.states
            .iter()
            .zip(row)
            .filter(|(_, p)| **p > 0.0)
            .map(|(&s, &p)| (s, p))
            .sorted_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)))
            .collect()
    }

    pub fn predict_top_k(&self, current: LocationId, k: usize) -> Vec<LocationId> {
        self.predict(current)
            .into_iter()
            .take(k)
            .map(|(s, _)| s)
            .collect()
    }

    pub fn most_likely_next(&self, current: LocationId) -> Option<LocationId> {
        self.predict(current).first().map(|(s, _)| *s)
    }

    /// Greedy walk of up to `length` steps from `start` (start excluded). Stops early at a
    /// state with no departures.
    pub fn most_likely_path(&self, start: LocationId, length: usize) -> Vec<LocationId> {
        let mut path = Vec::with_capacity(length);
        let mut current = start;
        while path.len() < length {
            let Some(next) = self.most_likely_next(current) else {
                break;
            };
            path.push(next);
            current = next;
        }
        path
    }

    /// States by descending training frequency; ties go to the lower id.
    pub fn frequency_order(&self) -> Vec<LocationId> {
        self.states
            .iter()
            .zip(&self.occurrences)
            .sorted_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)))
            .map(|(&s, _)| s)
            .collect()
    }

    pub fn most_frequent_state(&self) -> Option<LocationId> {
        self.frequency_order().first().copied()
    }

    pub fn occurrences(&self, state: LocationId) -> usize {
        self.index_of(state).map_or(0, |i| self.occurrences[i])
    }

    /// Plain-text transition table.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Markov model: {} states, {} transitions",
            self.states.len(),
            self.transition_count()
        );
        for (i, state) in self.states.iter().enumerate() {
            let successors = match &self.probabilities[i] {
                None => "no departures".to_string(),
                Some(_) => self
                    .predict(*state)
                    .iter()
                    .map(|(s, p)| format!("{s}: {p:.2}"))
                    .join(", "),
            };
            let _ = writeln!(out, "  {state} -> {successors}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const A: LocationId = LocationId(0);
    const B: LocationId = LocationId(1);
    const C: LocationId = LocationId(2);

    fn training() -> TransitionModel {
        TransitionModel::fit(&[A, B, A, B, A, C])
    }

    #[test]
    fn counts_and_rows() {
        let m = training();
        assert_eq!(m.states(), &[A, B, C]);
        assert_eq!(m.counts()[0], vec![0, 2, 1]);
        assert_eq!(m.counts()[1], vec![2, 0, 0]);
        assert_eq!(m.transition_count(), 5);

        let row = m.row(A).unwrap();
        assert!((row[1] - 2.0 / 3.0).abs() < 1e-12);
        assert!((row[2] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(m.probability(B, A), Some(1.0));
    }

    #[test]
    fn rows_are_stochastic_or_absent() {
        let m = TransitionModel::fit(&[A, B, C, A, C, C, B, A, B]);
        for &s in m.states() {
            if let Some(row) = m.row(s) {
                let sum: f64 = row.iter().sum();
                assert!((sum - 1.0).abs() < 1e-9);
                assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
            }
        }
    }

    #[test]
    fn never_departed_state_has_no_prediction() {
        let m = training();
        assert!(m.row(C).is_none());
        assert!(m.predict(C).is_empty());
        assert!(m.predict(LocationId(99)).is_empty());
    }

    #[test]
    fn predictions_rank_by_probability_then_id() {
        let m = training();
        assert_eq!(m.predict_top_k(A, 3), vec![B, C]);

        let tied = TransitionModel::fit(&[A, C, A, B]);
        assert_eq!(tied.predict_top_k(A, 2), vec![B, C]);
        assert_eq!(tied.most_likely_next(A), Some(B));
    }

    #[test]
    fn frequency_order_breaks_ties_by_id() {
        let m = training();
        assert_eq!(m.frequency_order(), vec![A, B, C]);
        assert_eq!(m.most_frequent_state(), Some(A));
        assert_eq!(m.occurrences(A), 3);

        let tied = TransitionModel::fit(&[C, B, C, B]);
        assert_eq!(tied.most_frequent_state(), Some(B));
    }

    #[test]
    fn greedy_path_stops_at_dead_end() {
        let m = training();
        assert_eq!(m.most_likely_path(A, 4), vec![B, A, B, A]);
        assert!(m.most_likely_path(C, 3).is_empty());

        let chain = TransitionModel::fit(&[A, B, C]);
        assert_eq!(chain.most_likely_path(A, 5), vec![B, C]);
    }

    #[test]
    fn empty_and_single_state_sequences() {
        let empty = TransitionModel::fit(&[]);
        assert!(empty.states().is_empty());
        assert_eq!(empty.most_frequent_state(), None);

        let single = TransitionModel::fit(&[A]);
        assert_eq!(single.states(), &[A]);
        assert_eq!(single.transition_count(), 0);
    }

    #[test]
    fn idle_gap_filter_skips_long_absences() {
        let t = |h: i64| {
            NaiveDate::from_ymd_opt(2009, 2, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                + TimeDelta::hours(h)
        };
        let visit = |id, from, to| VisitEvent {
            location_id: id,
            arrival: t(from),
            departure: t(to),
        };
        let visits = [visit(A, 0, 8), visit(B, 9, 17), visit(C, 90, 95)];

        let all = TransitionModel::fit_visits(&visits, None);
        assert_eq!(all.transition_count(), 2);

        let gapped = TransitionModel::fit_visits(&visits, Some(TimeDelta::hours(24)));
        assert_eq!(gapped.transition_count(), 1);
        assert_eq!(gapped.states(), &[A, B, C]);
        assert!(gapped.row(B).is_none());
    }

    #[test]
    fn summary_lists_every_state() {
        let text = training().summary();
        assert!(text.contains("3 states, 5 transitions"));
        assert!(text.contains("0 -> 1: 0.67, 2: 0.33"));
        assert!(text.contains("2 -> no departures"));
    }
}
