//! Closest-stronghold correction.
//!
//! An eye of ender only points at the nearest stronghold. A candidate is
//! therefore only the true target if no other stronghold of any ring sits
//! closer to the player. For each ring slot that could host such an
//! occluder, the probability that it lands inside the disc of radius
//! `|candidate - player|` is integrated with a short quadrature over the
//! slot's angular jitter, and the candidate is scaled by `∏(1 - p)`.
//!
//! Only a prefix of the ranked set is evaluated exactly; the remainder is
//! scaled by the mean factor observed on that prefix.

use crate::density::DensityField;
use crate::posterior::normalize_certainties;
use crate::rings::{max_stronghold_distance_blocks, ring_for_chunk_radius, rings, RingInfo};
use crate::types::{sort_by_certainty, EyeThrow, Prediction};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, SQRT_2};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConditionerOptions {
    /// Leading candidates always evaluated exactly.
    pub exact_top_n: usize,
    /// Candidates above this certainty are evaluated exactly as well.
    pub certainty_floor: f64,
    /// Quadrature samples on each side of a slot centre.
    pub quadrature_half_span: i32,
}

impl Default for ConditionerOptions {
    fn default() -> Self {
        Self {
            exact_top_n: 100,
            certainty_floor: 0.001,
            quadrature_half_span: 7,
        }
    }
}

/// Summary of one conditioner pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionerStats {
    /// Candidates evaluated exactly.
    pub evaluated: usize,
    /// Mean factor applied to the remaining candidates.
    pub mean_factor: f64,
}

/// Polar description of the player relative to one candidate.
struct OccluderGeometry {
    /// Candidate azimuth around the world origin.
    phi_candidate: f64,
    /// Player azimuth around the world origin.
    phi_player: f64,
    /// Player radius in chunks.
    r_player: f64,
    /// Player to candidate distance in chunks.
    distance: f64,
}

/// Conditions `predictions` on `reference` being the closest stronghold's
/// bearing, then renormalises. The slice is left sorted by prior certainty.
pub fn apply_closest_stronghold_condition(
    predictions: &mut [Prediction],
    reference: &EyeThrow,
    options: &ConditionerOptions,
) -> Option<ConditionerStats> {
    if predictions.is_empty() {
        return None;
    }
    sort_by_certainty(predictions);

    let above_floor = predictions
        .iter()
        .take_while(|p| p.certainty > options.certainty_floor)
        .count();
    let exact = options.exact_top_n.max(above_floor).min(predictions.len());

    let field = DensityField::shared();
    let max_distance = max_stronghold_distance_blocks(reference.x, reference.z) / 16.0;
    let factors = exact_factors(
        &predictions[..exact],
        reference,
        field,
        max_distance,
        options.quadrature_half_span,
    );

    let mut total = 0.0;
    for (p, factor) in predictions.iter_mut().zip(&factors) {
        // Unmatched candidates keep their weight but still count as zero.
        if let Some(f) = factor {
            p.certainty *= f;
            total += f;
        }
    }
    let mean_factor = if exact > 0 { total / exact as f64 } else { 0.0 };
    if exact > 0 {
        for p in predictions[exact..].iter_mut() {
            p.certainty *= mean_factor;
        }
    }

    debug!(
        "conditioner: evaluated={} of {} mean_factor={:.5}",
        exact,
        predictions.len(),
        mean_factor
    );
    if !normalize_certainties(predictions) {
        warn!("conditioner: weights collapsed");
        return None;
    }
    Some(ConditionerStats {
        evaluated: exact,
        mean_factor,
    })
}

fn exact_factors(
    prefix: &[Prediction],
    reference: &EyeThrow,
    field: &DensityField,
    max_distance: f64,
    half_span: i32,
) -> Vec<Option<f64>> {
    #[cfg(feature = "parallel")]
    {
        prefix
            .par_iter()
            .map(|p| closest_stronghold_factor(p.chunk(), reference, field, max_distance, half_span))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        prefix
            .iter()
            .map(|p| closest_stronghold_factor(p.chunk(), reference, field, max_distance, half_span))
            .collect()
    }
}

/// Probability that no other stronghold is closer to the player than
/// `chunk`. `None` when the candidate lies outside every ring or on the
/// player.
pub fn closest_stronghold_factor(
    chunk: (i32, i32),
    reference: &EyeThrow,
    field: &DensityField,
    max_distance_chunks: f64,
    half_span: i32,
) -> Option<f64> {
    let (cx, cz) = (f64::from(chunk.0), f64::from(chunk.1));
    let dx = cx + (8.0 - reference.x) / 16.0;
    let dz = cz + (8.0 - reference.z) / 16.0;
    let geometry = OccluderGeometry {
        phi_candidate: -cx.atan2(cz),
        phi_player: -reference.x.atan2(reference.z),
        r_player: reference.radius_chunks(),
        distance: (dx * dx + dz * dz).sqrt(),
    };
    if geometry.distance <= 1e-12 {
        return None;
    }
    let own_ring = ring_for_chunk_radius((cx * cx + cz * cz).sqrt())?;

    let r_min = geometry.r_player - max_distance_chunks;
    let r_max = geometry.r_player + max_distance_chunks;
    let mut factor = 1.0;
    for ring in rings() {
        if r_max < ring.inner_radius || r_min > ring.outer_radius {
            continue;
        }
        let same_ring = own_ring.ring_index == ring.ring_index;
        if same_ring && own_ring.inner_radius.abs() <= 1e-12 {
            continue;
        }
        let dphi = if same_ring {
            2.0 / 15.0 * 15.0 * SQRT_2 / own_ring.inner_radius
        } else {
            2.0 / 15.0 * PI / f64::from(ring.strongholds_in_ring)
        };
        for slot in 0..ring.strongholds_in_ring {
            if same_ring && slot == 0 {
                continue;
            }
            let p = occluder_probability(ring, slot, dphi, &geometry, same_ring, field, half_span);
            factor *= 1.0 - p;
        }
    }
    Some(factor)
}

/// Probability that slot `slot` of `ring` (counted from the candidate's own
/// azimuth) holds a stronghold closer to the player than the candidate.
fn occluder_probability(
    ring: &RingInfo,
    slot: u32,
    dphi: f64,
    geometry: &OccluderGeometry,
    same_ring: bool,
    field: &DensityField,
    half_span: i32,
) -> f64 {
    let slot_count = f64::from(ring.strongholds_in_ring);
    let slot_centre = geometry.phi_candidate + f64::from(slot) * 2.0 * PI / slot_count;
    let mut pdf_integral = 0.0;
    let mut integral = 0.0;

    for k in -half_span..=half_span {
        let offset = f64::from(k) * dphi;
        let pdf = if same_ring {
            // Snapping jitter of a neighbouring slot, relative to our own.
            let term = offset * ring.inner_radius / (15.0 * SQRT_2);
            (1.0 + term).max(0.0).powf(4.5) * (1.0 - term).max(0.0).powf(4.5)
        } else {
            1.0
        };
        pdf_integral += pdf * dphi;

        let gamma = geometry.phi_player - (slot_centre + offset);
        let sin_gamma = gamma.sin();
        if sin_gamma.abs() <= 1e-12 {
            continue;
        }
        let sin_beta = geometry.r_player / geometry.distance * sin_gamma;
        if !(sin_beta > -1.0 && sin_beta < 1.0) {
            continue;
        }
        let beta = sin_beta.asin();
        let alpha0 = beta - gamma;
        let alpha1 = PI - gamma - beta;
        let lo = ring.inner_radius_post_snapping;
        let hi = ring.outer_radius_post_snapping;
        let r0 = (geometry.distance * alpha0.sin() / sin_gamma).clamp(lo, hi);
        let r1 = (geometry.distance * alpha1.sin() / sin_gamma).clamp(lo, hi);

        integral += pdf * (field.cumulative_polar(r1) - field.cumulative_polar(r0)) * dphi / slot_count;
    }

    if pdf_integral > 0.0 {
        integral /= pdf_integral;
    }
    if !integral.is_finite() {
        return 0.0;
    }
    integral.clamp(0.0, 1.0)
}
