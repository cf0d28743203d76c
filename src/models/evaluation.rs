use {
    crate::domain::LocationId,
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Hit rates of one predictor over the evaluated transitions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Accuracy {
    pub next_step: f64,
    pub top_k: f64,
}

/// Top-k hit rate of the transitions leaving one state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateAccuracy {
    pub location_id: LocationId,
    pub transitions: usize,
    pub top_k: f64,
}

/// Held-out evaluation of a transition model against the most-frequent-state baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub k: usize,
    pub transitions_evaluated: usize,
    pub model: Accuracy,
    pub baseline: Accuracy,
    /// `min(k, n) / n` over the n distinct states of the held-out slice.
    pub random_top_k: f64,
    /// None when the baseline scored 0.
    pub next_step_improvement_pct: Option<f64>,
    pub top_k_improvement_pct: Option<f64>,
    pub per_state: Vec<StateAccuracy>,
}

/// Relative gain over the baseline, in percent. Undefined for a zero baseline.
pub fn improvement_pct(model: f64, baseline: f64) -> Option<f64> {
    (baseline > 0.0).then(|| (model - baseline) / baseline * 100.0)
}

impl EvaluationMetrics {
    pub fn to_record(&self) -> EvaluationRecord {
        EvaluationRecord {
            transitions_evaluated: self.transitions_evaluated,
            k: self.k,
            model_next_step: self.model.next_step,
            baseline_next_step: self.baseline.next_step,
            next_step_improvement_pct: self.next_step_improvement_pct.unwrap_or(f64::NAN),
            next_step_improvement_defined: self.next_step_improvement_pct.is_some(),
            model_top_k: self.model.top_k,
            baseline_top_k: self.baseline.top_k,
            top_k_improvement_pct: self.top_k_improvement_pct.unwrap_or(f64::NAN),
            top_k_improvement_defined: self.top_k_improvement_pct.is_some(),
            random_top_k: self.random_top_k,
        }
    }
}

fn fmt_improvement(v: Option<f64>) -> String {
    v.map_or_else(|| "undefined".to_string(), |p| format!("{p:+.2}%"))
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transitions evaluated: {}", self.transitions_evaluated)?;
        writeln!(
            f,
            "Next-step accuracy: model {:.2}% vs baseline {:.2}% (improvement {})",
            self.model.next_step * 100.0,
            self.baseline.next_step * 100.0,
            fmt_improvement(self.next_step_improvement_pct)
        )?;
        writeln!(
            f,
            "Top-{} accuracy: model {:.2}% vs baseline {:.2}% (improvement {}), random {:.2}%",
            self.k,
            self.model.top_k * 100.0,
            self.baseline.top_k * 100.0,
            fmt_improvement(self.top_k_improvement_pct),
            self.random_top_k * 100.0
        )?;
        for state in &self.per_state {
            writeln!(
                f,
                "  from {}: {:.2}% over {} transitions",
                state.location_id,
                state.top_k * 100.0,
                state.transitions
            )?;
        }
        Ok(())
    }
}

/// Flat, serialisable projection of [`EvaluationMetrics`]. Undefined improvements are NaN
/// with the matching `_defined` flag cleared.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub transitions_evaluated: usize,
    pub k: usize,
    pub model_next_step: f64,
    pub baseline_next_step: f64,
    pub next_step_improvement_pct: f64,
    pub next_step_improvement_defined: bool,
    pub model_top_k: f64,
    pub baseline_top_k: f64,
    pub top_k_improvement_pct: f64,
    pub top_k_improvement_defined: bool,
    pub random_top_k: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(baseline_next: f64) -> EvaluationMetrics {
        EvaluationMetrics {
            k: 3,
            transitions_evaluated: 3,
            model: Accuracy {
                next_step: 2.0 / 3.0,
                top_k: 2.0 / 3.0,
            },
            baseline: Accuracy {
                next_step: baseline_next,
                top_k: 1.0,
            },
            random_top_k: 1.0,
            next_step_improvement_pct: improvement_pct(2.0 / 3.0, baseline_next),
            top_k_improvement_pct: improvement_pct(2.0 / 3.0, 1.0),
            per_state: Vec::new(),
        }
    }

    #[test]
    fn improvement_is_relative_and_undefined_at_zero() {
        assert!((improvement_pct(2.0 / 3.0, 1.0 / 3.0).unwrap() - 100.0).abs() < 1e-9);
        assert!((improvement_pct(2.0 / 3.0, 1.0).unwrap() + 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(improvement_pct(0.5, 0.0), None);
    }

    #[test]
    fn record_flags_undefined_improvement() {
        let rec = metrics(0.0).to_record();
        assert!(rec.next_step_improvement_pct.is_nan());
        assert!(!rec.next_step_improvement_defined);
        assert!(rec.top_k_improvement_defined);

        let rec = metrics(1.0 / 3.0).to_record();
        assert!(rec.next_step_improvement_defined);
        assert!((rec.next_step_improvement_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn display_mentions_undefined() {
        let text = metrics(0.0).to_string();
        assert!(text.contains("improvement undefined"));
        assert!(text.contains("Top-3 accuracy"));
    }
}
