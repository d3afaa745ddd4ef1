//! Sequential Bayesian filter over candidate chunks.
//!
//! Starting from the candidate priors, every throw multiplies each candidate
//! by a Gaussian likelihood of its angular residual and the set is
//! renormalised before the next throw is applied. The closest-stronghold
//! correction runs once at the end, followed by ranking and truncation.

use crate::angle::{chunk_center_blocks, heading_deg, signed_residual_deg};
use crate::sigma::SigmaSettings;
use crate::types::{sort_by_certainty, EyeThrow, Prediction};
use log::warn;
use serde::Deserialize;
use std::f64::consts::{PI, SQRT_2};

/// Floor applied to variances inside the objective.
const MIN_OBJECTIVE_VARIANCE: f64 = 1e-8;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PosteriorOptions {
    /// Ranked predictions kept after conditioning.
    pub max_predictions: usize,
}

impl Default for PosteriorOptions {
    fn default() -> Self {
        Self {
            max_predictions: 4096,
        }
    }
}

/// Extra angular variance (deg²) caused by the throw position being known
/// only to within a hundredth of a block.
///
/// Zero when the target coincides with the throw, or when both fractional
/// coordinates sit on a 0.3/0.7 corner, which pins the position exactly.
pub fn position_imprecision_variance(distance_sq: f64, throw_x: f64, throw_z: f64) -> f64 {
    if distance_sq <= 1e-9 {
        return 0.0;
    }
    let is_corner = |v: f64| {
        let frac = v - v.floor();
        (frac - 0.3).abs() < 1e-6 || (frac - 0.7).abs() < 1e-6
    };
    if is_corner(throw_x) && is_corner(throw_z) {
        return 0.0;
    }
    let max_lateral_error = 0.005 * SQRT_2 * 180.0 / PI;
    max_lateral_error * max_lateral_error / distance_sq / 6.0
}

/// Residual and raw variance of `throw` against a chunk's aim point.
fn residual_and_variance(chunk: (i32, i32), throw: &EyeThrow, sigmas: &SigmaSettings) -> (f64, f64) {
    let dx = chunk_center_blocks(chunk.0) - throw.x;
    let dz = chunk_center_blocks(chunk.1) - throw.z;
    let delta = signed_residual_deg(heading_deg(dx, dz), throw.angle_deg);
    let sigma = sigmas.sigma_for(throw.kind);
    let variance = sigma * sigma + position_imprecision_variance(dx * dx + dz * dz, throw.x, throw.z);
    (delta, variance)
}

/// `delta² / variance` of one throw against one chunk, or `None` when the
/// term is not finite.
pub fn throw_objective_term(chunk: (i32, i32), throw: &EyeThrow, sigmas: &SigmaSettings) -> Option<f64> {
    let (delta, variance) = residual_and_variance(chunk, throw, sigmas);
    let term = delta * delta / variance.max(MIN_OBJECTIVE_VARIANCE);
    term.is_finite().then_some(term)
}

/// Summed objective over all throws; infinite for an empty throw list.
pub fn angle_objective(chunk: (i32, i32), throws: &[EyeThrow], sigmas: &SigmaSettings) -> f64 {
    if throws.is_empty() {
        return f64::INFINITY;
    }
    throws
        .iter()
        .map(|t| {
            let (delta, variance) = residual_and_variance(chunk, t, sigmas);
            delta * delta / variance.max(MIN_OBJECTIVE_VARIANCE)
        })
        .sum()
}

/// Rescales certainties to sum to one, counting only finite positive weights.
/// Returns false when there is nothing to normalise against.
pub fn normalize_certainties(predictions: &mut [Prediction]) -> bool {
    let total: f64 = predictions
        .iter()
        .map(|p| p.certainty)
        .filter(|c| c.is_finite() && *c > 0.0)
        .sum();
    if !(total > 0.0) || !total.is_finite() {
        return false;
    }
    for p in predictions.iter_mut() {
        p.certainty = p.certainty.max(0.0) / total;
    }
    true
}

/// Multiplies each candidate by the Gaussian likelihood of `throw`.
pub fn apply_throw_condition(predictions: &mut [Prediction], throw: &EyeThrow, sigmas: &SigmaSettings) {
    for p in predictions.iter_mut() {
        let (delta, variance) = residual_and_variance(p.chunk(), throw, sigmas);
        if !(variance > 0.0) || !variance.is_finite() {
            continue;
        }
        p.certainty *= (-(delta * delta) / (2.0 * variance)).exp();
    }
}

/// Runs the sequential filter over an arbitrary prior.
pub fn posterior_from_prior(
    mut predictions: Vec<Prediction>,
    throws: &[EyeThrow],
    sigmas: &SigmaSettings,
) -> Option<Vec<Prediction>> {
    if predictions.is_empty() || throws.is_empty() {
        return None;
    }
    if !normalize_certainties(&mut predictions) {
        warn!("posterior: prior weights collapsed");
        return None;
    }
    for (index, throw) in throws.iter().enumerate() {
        apply_throw_condition(&mut predictions, throw, sigmas);
        if !normalize_certainties(&mut predictions) {
            warn!("posterior: weights collapsed after throw {index}");
            return None;
        }
    }
    Some(predictions)
}

/// Sorts descending, keeps the best `max_predictions` and renormalises the
/// survivors.
pub fn rank_and_truncate(predictions: &mut Vec<Prediction>, max_predictions: usize) -> bool {
    sort_by_certainty(predictions);
    if predictions.len() > max_predictions {
        predictions.truncate(max_predictions);
    }
    normalize_certainties(predictions)
}
