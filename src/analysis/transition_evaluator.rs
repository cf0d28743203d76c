//! Held-out evaluation of the transition model and the sequence preparation around it.

use {
    crate::{
        domain::LocationId,
        error::PipelineError,
        models::{Accuracy, EvaluationMetrics, StateAccuracy, TransitionModel, improvement_pct},
    },
    itertools::Itertools,
    std::collections::{BTreeMap, HashMap},
};

/// Chronological split at `floor(len * train_fraction)`. The held-out slice starts at the
/// last training element so the boundary transition is evaluated too.
pub fn train_test_split<T>(sequence: &[T], train_fraction: f64) -> (&[T], &[T]) {
    let split = ((sequence.len() as f64 * train_fraction).floor() as usize).min(sequence.len());
    let test_start = split.saturating_sub(1);
    (&sequence[..split], &sequence[test_start..])
}

/// Replaces states visited fewer than `min_visits` times with [`LocationId::OTHER`].
/// States missing from `visit_counts` count as unvisited.
pub fn collapse_rare_states(
    sequence: &[LocationId],
    visit_counts: &HashMap<LocationId, usize>,
    min_visits: usize,
) -> Vec<LocationId> {
    sequence
        .iter()
        .map(|id| {
            if visit_counts.get(id).copied().unwrap_or(0) < min_visits {
                LocationId::OTHER
            } else {
                *id
            }
        })
        .collect()
}

/// Walks each `(current, next)` pair of `held_out`, scoring the model and the
/// context-free baseline (most frequent training state, global frequency order for top-k).
pub fn evaluate(model: &TransitionModel, held_out: &[LocationId], k: usize) -> EvaluationMetrics {
    let k = k.max(1);
    let baseline_order: Vec<LocationId> = model.frequency_order().into_iter().take(k).collect();
    let baseline_next = baseline_order.first().copied();

    let mut model_hits = (0usize, 0usize);
    let mut baseline_hits = (0usize, 0usize);
    let mut per_state: BTreeMap<LocationId, (usize, usize)> = BTreeMap::new();
    let mut transitions = 0usize;

    for (&current, &actual) in held_out.iter().tuple_windows() {
        transitions += 1;
        let predicted = model.predict_top_k(current, k);

        let top_hit = predicted.contains(&actual);
        if predicted.first() == Some(&actual) {
            model_hits.0 += 1;
        }
        if top_hit {
            model_hits.1 += 1;
        }
        if baseline_next == Some(actual) {
            baseline_hits.0 += 1;
        }
        if baseline_order.contains(&actual) {
            baseline_hits.1 += 1;
        }

        let entry = per_state.entry(current).or_default();
        entry.0 += 1;
        if top_hit {
            entry.1 += 1;
        }
    }

    let distinct = held_out.iter().unique().count();
    let random_top_k = if distinct == 0 {
        0.0
    } else {
        k.min(distinct) as f64 / distinct as f64
    };

    if transitions == 0 {
        log::warn!(
            "{}",
            PipelineError::InsufficientData {
                stage: "transition evaluation",
                needed: 2,
                found: held_out.len()
            }
        );
        return EvaluationMetrics {
            k,
            transitions_evaluated: 0,
            model: Accuracy::default(),
            baseline: Accuracy::default(),
            random_top_k,
            next_step_improvement_pct: None,
            top_k_improvement_pct: None,
            per_state: Vec::new(),
        };
    }

    let rate = |hits: usize| hits as f64 / transitions as f64;
    let model_acc = Accuracy {
        next_step: rate(model_hits.0),
        top_k: rate(model_hits.1),
    };
    let baseline_acc = Accuracy {
        next_step: rate(baseline_hits.0),
        top_k: rate(baseline_hits.1),
    };

    let next_step_improvement_pct = improvement_pct(model_acc.next_step, baseline_acc.next_step);
    if next_step_improvement_pct.is_none() {
        log::debug!("{}", PipelineError::DegenerateMetric("zero next-step baseline accuracy"));
    }

    let metrics = EvaluationMetrics {
        k,
        transitions_evaluated: transitions,
        model: model_acc,
        baseline: baseline_acc,
        random_top_k,
        next_step_improvement_pct,
        top_k_improvement_pct: improvement_pct(model_acc.top_k, baseline_acc.top_k),
        per_state: per_state
            .into_iter()
            .map(|(location_id, (n, hits))| StateAccuracy {
                location_id,
                transitions: n,
                top_k: hits as f64 / n as f64,
            })
            .collect(),
    };

    log::info!(
        "Evaluated {} transitions: next-step {:.3} (baseline {:.3}), top-{} {:.3} (baseline {:.3})",
        transitions,
        metrics.model.next_step,
        metrics.baseline.next_step,
        k,
        metrics.model.top_k,
        metrics.baseline.top_k
    );
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: LocationId = LocationId(0);
    const B: LocationId = LocationId(1);
    const C: LocationId = LocationId(2);

    fn worked() -> EvaluationMetrics {
        let model = TransitionModel::fit(&[A, B, A, B, A, C]);
        evaluate(&model, &[B, A, B, C], 3)
    }

    #[test]
    fn next_step_against_most_frequent_baseline() {
        let m = worked();
        assert_eq!(m.transitions_evaluated, 3);
        assert!((m.model.next_step - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.baseline.next_step - 1.0 / 3.0).abs() < 1e-12);
        assert!((m.next_step_improvement_pct.unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn top_k_against_frequency_order() {
        let m = worked();
        assert!((m.model.top_k - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.baseline.top_k - 1.0).abs() < 1e-12);
        assert!((m.top_k_improvement_pct.unwrap() + 100.0 / 3.0).abs() < 1e-9);
        assert!((m.random_top_k - 1.0).abs() < 1e-12);
    }

    #[test]
    fn per_state_accuracy_groups_by_origin() {
        let m = worked();
        assert_eq!(
            m.per_state,
            vec![
                StateAccuracy {
                    location_id: A,
                    transitions: 1,
                    top_k: 1.0
                },
                StateAccuracy {
                    location_id: B,
                    transitions: 2,
                    top_k: 0.5
                },
            ]
        );
    }

    #[test]
    fn zero_baseline_leaves_improvement_undefined() {
        // Baseline always guesses A; the held-out slice never reaches A.
        let model = TransitionModel::fit(&[A, A, A, B, C]);
        let m = evaluate(&model, &[B, C, B, C], 1);
        assert_eq!(m.baseline.next_step, 0.0);
        assert_eq!(m.next_step_improvement_pct, None);
        assert!(m.to_record().next_step_improvement_pct.is_nan());
    }

    #[test]
    fn unknown_states_count_as_misses() {
        let model = TransitionModel::fit(&[A, B, A]);
        let m = evaluate(&model, &[LocationId(7), A, LocationId(8)], 2);
        assert_eq!(m.transitions_evaluated, 2);
        assert_eq!(m.model.next_step, 0.0);
        assert!((m.random_top_k - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn short_held_out_slice_evaluates_nothing() {
        let model = TransitionModel::fit(&[A, B, A]);
        let m = evaluate(&model, &[A], 3);
        assert_eq!(m.transitions_evaluated, 0);
        assert_eq!(m.next_step_improvement_pct, None);
    }

    #[test]
    fn split_shares_the_boundary_element() {
        let seq: Vec<LocationId> = (0..10).map(LocationId).collect();
        let (train, test) = train_test_split(&seq, 0.8);
        assert_eq!(train.len(), 8);
        assert_eq!(test.first(), train.last());
        assert_eq!(test.len(), 3);

        let (train, test) = train_test_split::<LocationId>(&[], 0.8);
        assert!(train.is_empty() && test.is_empty());
    }

    #[test]
    fn rare_states_collapse_to_other() {
        let seq = [A, B, A, C, A, B];
        let counts: HashMap<LocationId, usize> = seq.iter().copied().counts();
        let collapsed = collapse_rare_states(&seq, &counts, 2);
        assert_eq!(collapsed, vec![A, B, A, LocationId::OTHER, A, B]);

        assert_eq!(collapse_rare_states(&seq, &counts, 0), seq.to_vec());
    }
}
