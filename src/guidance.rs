//! Advice derived from a ranked posterior: combined certainty of adjacent
//! chunks, a mismeasurement warning, and how far to walk sideways before
//! the next throw.

use crate::angle::{
    are_neighboring_chunks, bearing_to_chunk_deg, chunk_center_blocks, heading_rad,
    normalize_degrees,
};
use crate::sigma::SigmaSettings;
use crate::types::{sort_by_certainty, EyeThrow, Prediction};
use log::debug;
use serde::{Deserialize, Serialize};

pub const MISMEASURE_WARNING: &str =
    "Detected unusually large errors, you probably mismeasured or your standard deviation is too low.";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GuidanceOptions {
    /// Minimum summed certainty of two adjacent chunks to report them jointly.
    pub combined_min_sum: f64,
    /// Above this top certainty the joint figure is not needed.
    pub combined_max_top: f64,
    /// Likelihood ratio below which the throws look mismeasured.
    pub mismeasure_ratio: f64,
    /// Lower edge of the band in which next-throw advice is given.
    pub guidance_band_low: f64,
    /// Expected top certainty the next throw should reach.
    pub target_certainty: f64,
    /// Candidates are considered until this cumulative mass is covered.
    pub considered_mass: f64,
    pub max_considered: usize,
    /// Initial sideways search step (blocks).
    pub search_step: f64,
    /// Search stops once the step falls to this (blocks).
    pub search_resolution: f64,
    /// Search stops beyond this sideways distance (blocks).
    pub search_cap: f64,
    pub max_iterations: usize,
}

impl Default for GuidanceOptions {
    fn default() -> Self {
        Self {
            combined_min_sum: 0.80,
            combined_max_top: 0.95,
            mismeasure_ratio: 0.01,
            guidance_band_low: 0.05,
            target_certainty: 0.95,
            considered_mass: 0.99,
            max_considered: 4096,
            search_step: 5.0,
            search_resolution: 0.1,
            search_cap: 5000.0,
            max_iterations: 1000,
        }
    }
}

/// Blocks to walk perpendicular to the last bearing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextThrow {
    pub left_blocks: i32,
    pub right_blocks: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Guidance {
    pub combined_certainty_percent: Option<f64>,
    pub next_throw: Option<NextThrow>,
    pub warning: Option<String>,
}

/// Collects all guidance for a ranked posterior and the active throws.
///
/// Direction advice is forced while at most one throw is active and
/// suppressed once the top certainty reaches the target. The mismeasure
/// check only runs when the top prediction clears `min_successful`.
pub fn estimate_guidance(
    predictions: &[Prediction],
    throws: &[EyeThrow],
    sigmas: &SigmaSettings,
    options: &GuidanceOptions,
    min_successful: f64,
) -> Guidance {
    let mut sorted = predictions.to_vec();
    sort_by_certainty(&mut sorted);
    let Some(top) = sorted.first().copied() else {
        return Guidance::default();
    };

    let force = throws.len() <= 1;
    let next_throw = if top.certainty >= options.target_certainty {
        None
    } else {
        next_throw_direction(&sorted, throws, sigmas, force, options)
    };
    let warning = (top.certainty > min_successful)
        .then(|| mismeasure_warning(throws, top.chunk(), sigmas, options))
        .flatten();

    Guidance {
        combined_certainty_percent: combined_certainty_percent(&sorted, options),
        next_throw,
        warning,
    }
}

/// Joint certainty (percent) of the two best chunks when they touch and
/// the best alone is not already conclusive.
pub fn combined_certainty_percent(predictions: &[Prediction], options: &GuidanceOptions) -> Option<f64> {
    if predictions.len() < 2 {
        return None;
    }
    let mut sorted = predictions.to_vec();
    sort_by_certainty(&mut sorted);
    let (best, second) = (sorted[0], sorted[1]);
    if best.certainty > options.combined_max_top {
        return None;
    }
    if !are_neighboring_chunks(best.chunk(), second.chunk()) {
        return None;
    }
    let combined = best.certainty + second.certainty;
    if combined <= options.combined_min_sum {
        return None;
    }
    Some((combined * 100.0).clamp(0.0, 100.0))
}

/// Warning text when the throws fit the best chunk far worse than
/// measurement noise would explain.
pub fn mismeasure_warning(
    throws: &[EyeThrow],
    best_chunk: (i32, i32),
    sigmas: &SigmaSettings,
    options: &GuidanceOptions,
) -> Option<String> {
    if throws.is_empty() {
        return None;
    }
    let target_x = chunk_center_blocks(best_chunk.0);
    let target_z = chunk_center_blocks(best_chunk.1);
    let mut likelihood = 1.0;
    let mut expected = 1.0;
    for t in throws {
        if target_x == t.x && target_z == t.z {
            continue;
        }
        let gamma = bearing_to_chunk_deg(best_chunk.0, best_chunk.1, t.x, t.z);
        let error = normalize_degrees(gamma - t.angle_deg);
        let sigma = sigmas.sigma_for(t.kind).max(1e-6);
        likelihood *= (-0.5 * (error / sigma) * (error / sigma)).exp();
        expected *= std::f64::consts::FRAC_1_SQRT_2;
    }
    if expected <= 0.0 {
        return None;
    }
    let ratio = likelihood / expected;
    (ratio < options.mismeasure_ratio).then(|| MISMEASURE_WARNING.to_string())
}

/// Sideways distances after which another throw is expected to push the
/// top certainty above the target. `None` outside the ambiguous band unless
/// `force` is set.
pub fn next_throw_direction(
    predictions: &[Prediction],
    throws: &[EyeThrow],
    sigmas: &SigmaSettings,
    force: bool,
    options: &GuidanceOptions,
) -> Option<NextThrow> {
    let last = throws.last()?;
    if predictions.is_empty() {
        return None;
    }
    let mut sorted = predictions.to_vec();
    sort_by_certainty(&mut sorted);
    let best = sorted[0].certainty;
    if !force && !(best > options.guidance_band_low && best < options.target_certainty) {
        return None;
    }

    let minimum = if force { sorted.len().min(2) } else { 1 };
    let mut considered = Vec::new();
    let mut cumulative = 0.0;
    for p in &sorted {
        if (cumulative > options.considered_mass && considered.len() >= minimum)
            || considered.len() >= options.max_considered.max(minimum)
        {
            break;
        }
        cumulative += p.certainty.max(0.0);
        considered.push(*p);
    }
    if considered.is_empty() {
        return None;
    }

    let sigma = sigmas.sigma_for(last.kind);
    let right = sideways_distance(&considered, last, (last.angle_deg + 90.0).to_radians(), sigma, options);
    let left = sideways_distance(&considered, last, (last.angle_deg - 90.0).to_radians(), sigma, options);
    debug!(
        "guidance: considered={} left={:.1} right={:.1}",
        considered.len(),
        left,
        right
    );
    Some(NextThrow {
        left_blocks: left.ceil().max(0.0) as i32,
        right_blocks: right.ceil().max(0.0) as i32,
    })
}

/// Expanding-then-bisecting search along heading `phi_sideways`.
fn sideways_distance(
    predictions: &[Prediction],
    last: &EyeThrow,
    phi_sideways: f64,
    sigma_deg: f64,
    options: &GuidanceOptions,
) -> f64 {
    let mut expected = 0.0;
    let mut distance = 0.0;
    let mut step = options.search_step;
    let mut bisecting = false;
    for _ in 0..options.max_iterations {
        distance += if expected > options.target_certainty { -step } else { step };
        let x = last.x - distance * phi_sideways.sin();
        let z = last.z + distance * phi_sideways.cos();
        expected = expected_top_certainty_after_move(predictions, x, z, sigma_deg);
        if expected > options.target_certainty {
            bisecting = true;
        }
        if bisecting {
            step *= 0.5;
        }
        if step <= options.search_resolution || distance > options.search_cap {
            break;
        }
    }
    distance
}

fn measurement_error_pdf(error_rad: f64, sigma_deg: f64) -> f64 {
    if sigma_deg <= 1e-9 {
        return 0.0;
    }
    let error_deg = normalize_degrees(error_rad.to_degrees());
    (-error_deg * error_deg / (2.0 * sigma_deg * sigma_deg)).exp()
}

fn bearing_from(chunk: (i32, i32), x: f64, z: f64) -> f64 {
    heading_rad(chunk_center_blocks(chunk.0) - x, chunk_center_blocks(chunk.1) - z)
}

/// Expected top certainty if a throw were taken from `(x, z)`, averaged
/// over which prediction is the true stronghold.
pub fn expected_top_certainty_after_move(predictions: &[Prediction], x: f64, z: f64, sigma_deg: f64) -> f64 {
    let mut expected = 0.0;
    let mut total_prior = 0.0;
    for (i, assumed) in predictions.iter().enumerate() {
        let phi_true = bearing_from(assumed.chunk(), x, z);
        let mut hit = 0.0;
        let mut total = 0.0;
        for (j, other) in predictions.iter().enumerate() {
            if i == j {
                total += assumed.certainty * 0.9;
                hit += assumed.certainty * 0.9;
                continue;
            }
            let phi_other = bearing_from(other.chunk(), x, z);
            let likelihood = other.certainty * measurement_error_pdf(phi_other - phi_true, sigma_deg);
            total += likelihood;
            if are_neighboring_chunks(assumed.chunk(), other.chunk()) {
                hit += likelihood;
            }
        }
        if total <= 1e-9 {
            continue;
        }
        expected += hit / total * assumed.certainty;
        total_prior += assumed.certainty;
    }
    if total_prior <= 1e-9 {
        return 0.0;
    }
    expected / total_prior
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ThrowKind;

    #[test]
    fn adjacent_pair_reports_combined_certainty() {
        let preds = vec![
            Prediction::new(10, -20, 0.55),
            Prediction::new(11, -20, 0.30),
            Prediction::new(40, 3, 0.15),
        ];
        let pct = combined_certainty_percent(&preds, &GuidanceOptions::default()).expect("combined");
        assert!((pct - 85.0).abs() < 1e-9);
    }

    #[test]
    fn combined_certainty_requires_adjacency_and_mass() {
        let opts = GuidanceOptions::default();
        let apart = vec![Prediction::new(10, -20, 0.55), Prediction::new(13, -20, 0.30)];
        assert!(combined_certainty_percent(&apart, &opts).is_none());
        let light = vec![Prediction::new(10, -20, 0.45), Prediction::new(11, -20, 0.30)];
        assert!(combined_certainty_percent(&light, &opts).is_none());
        let conclusive = vec![Prediction::new(10, -20, 0.96), Prediction::new(11, -20, 0.04)];
        assert!(combined_certainty_percent(&conclusive, &opts).is_none());
    }

    #[test]
    fn warning_fires_on_large_residuals() {
        let sigmas = SigmaSettings::default();
        let opts = GuidanceOptions::default();
        let on_target = bearing_to_chunk_deg(0, 100, 8.0, 8.0);
        let good = [EyeThrow::new(8.0, 8.0, on_target, ThrowKind::Normal)];
        assert!(mismeasure_warning(&good, (0, 100), &sigmas, &opts).is_none());
        let bad = [EyeThrow::new(8.0, 8.0, on_target + 2.0, ThrowKind::Normal)];
        assert_eq!(
            mismeasure_warning(&bad, (0, 100), &sigmas, &opts).as_deref(),
            Some(MISMEASURE_WARNING)
        );
    }

    #[test]
    fn ambiguous_posterior_gets_direction_advice() {
        let sigmas = SigmaSettings::default();
        let opts = GuidanceOptions::default();
        let throw = EyeThrow::new(8.0, 8.0, 0.0, ThrowKind::Normal);
        // Chunks stacked along the bearing; a sideways step separates them.
        let preds = vec![
            Prediction::new(0, 90, 0.4),
            Prediction::new(0, 110, 0.35),
            Prediction::new(0, 130, 0.25),
        ];
        let advice = next_throw_direction(&preds, &[throw], &sigmas, false, &opts).expect("advice");
        assert!(advice.left_blocks > 0 && advice.right_blocks > 0);
        assert!(advice.left_blocks <= 5000 && advice.right_blocks <= 5000);
    }

    #[test]
    fn facing_negative_z_matches_the_mirrored_scene() {
        let sigmas = SigmaSettings::default();
        let opts = GuidanceOptions::default();
        // Point reflection through (8, 8) maps chunk (cx, cz) to (-cx, -cz).
        let north = vec![Prediction::new(0, 600, 0.6), Prediction::new(2, 600, 0.4)];
        let south = vec![Prediction::new(0, -600, 0.6), Prediction::new(-2, -600, 0.4)];
        for d in [0.0, 40.0, 250.0] {
            let a = expected_top_certainty_after_move(&north, 8.0 - d, 8.0, 0.1);
            let b = expected_top_certainty_after_move(&south, 8.0 + d, 8.0, 0.1);
            assert!((a - b).abs() < 1e-9, "d={d} north={a} south={b}");
        }
        assert!(expected_top_certainty_after_move(&south, 8.0, 8.0, 0.1) < 0.95);

        let towards_north = EyeThrow::new(8.0, 8.0, 0.0, ThrowKind::Normal);
        let towards_south = EyeThrow::new(8.0, 8.0, 180.0, ThrowKind::Normal);
        let a = next_throw_direction(&north, &[towards_north], &sigmas, true, &opts).expect("advice");
        let b = next_throw_direction(&south, &[towards_south], &sigmas, true, &opts).expect("advice");
        assert!((a.left_blocks - b.left_blocks).abs() <= 2, "{a:?} vs {b:?}");
        assert!((a.right_blocks - b.right_blocks).abs() <= 2, "{a:?} vs {b:?}");
    }

    #[test]
    fn confident_posterior_gets_no_direction_unless_forced() {
        let sigmas = SigmaSettings::default();
        let opts = GuidanceOptions::default();
        let throw = EyeThrow::new(8.0, 8.0, 0.0, ThrowKind::Normal);
        let preds = vec![Prediction::new(0, 90, 0.97), Prediction::new(0, 130, 0.03)];
        assert!(next_throw_direction(&preds, &[throw], &sigmas, false, &opts).is_none());
        assert!(next_throw_direction(&preds, &[throw], &sigmas, true, &opts).is_some());
        let guidance = estimate_guidance(&preds, &[throw], &sigmas, &opts, 0.0005);
        assert!(guidance.next_throw.is_none());
    }
}
