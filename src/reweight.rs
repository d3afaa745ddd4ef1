//! Incremental reweighting after local angle nudges.
//!
//! A manual nudge changes only the likelihood term of the nudged throw, so
//! the posterior can be updated in log space without regenerating candidates
//! or rerunning the closest-stronghold correction:
//!
//! `log w' = log w - ½·Σ_changed (objective(adjusted) - objective(base))`

use crate::posterior::throw_objective_term;
use crate::sigma::SigmaSettings;
use crate::types::{sort_by_certainty, EyeThrow, Prediction};
use log::{debug, warn};

/// Throws whose angles differ by less than this are treated as unchanged.
const UNCHANGED_ANGLE_EPS: f64 = 1e-9;

/// Reweights `predictions` for the angle changes between `base` and
/// `adjusted` (paired by index). Entries without positive certainty are
/// dropped. Returns the renormalised set sorted by certainty, or `None` when
/// any input is empty or the weights collapse.
pub fn reweight_predictions(
    predictions: &[Prediction],
    base: &[EyeThrow],
    adjusted: &[EyeThrow],
    sigmas: &SigmaSettings,
) -> Option<Vec<Prediction>> {
    if predictions.is_empty() || base.is_empty() || adjusted.is_empty() {
        return None;
    }
    let changed: Vec<(&EyeThrow, &EyeThrow)> = base
        .iter()
        .zip(adjusted)
        .filter(|(b, a)| (a.angle_deg - b.angle_deg).abs() > UNCHANGED_ANGLE_EPS)
        .collect();

    let mut weighted: Vec<(Prediction, f64)> = Vec::with_capacity(predictions.len());
    let mut max_log = f64::NEG_INFINITY;
    for p in predictions {
        if !(p.certainty > 0.0) || !p.certainty.is_finite() {
            continue;
        }
        let original = p.certainty.ln();
        let mut log_weight = original;
        let mut had_term = false;
        for (b, a) in &changed {
            let (Some(base_term), Some(adjusted_term)) = (
                throw_objective_term(p.chunk(), b, sigmas),
                throw_objective_term(p.chunk(), a, sigmas),
            ) else {
                continue;
            };
            log_weight -= 0.5 * (adjusted_term - base_term);
            had_term = true;
        }
        if !log_weight.is_finite() {
            continue;
        }
        if !had_term {
            log_weight = original;
        }
        max_log = max_log.max(log_weight);
        weighted.push((*p, log_weight));
    }

    let dropped = predictions.len() - weighted.len();
    if weighted.is_empty() || !max_log.is_finite() {
        warn!("reweight: no finite log weights");
        return None;
    }
    let total: f64 = weighted.iter().map(|(_, lw)| (lw - max_log).exp()).sum();
    if !(total > 0.0) || !total.is_finite() {
        warn!("reweight: normaliser collapsed");
        return None;
    }

    let mut out: Vec<Prediction> = weighted
        .into_iter()
        .map(|(p, lw)| Prediction::new(p.chunk_x, p.chunk_z, (lw - max_log).exp() / total))
        .collect();
    sort_by_certainty(&mut out);
    debug!(
        "reweight: changed_throws={} kept={} dropped={}",
        changed.len(),
        out.len(),
        dropped
    );
    Some(out)
}
