//! Candidate chunk enumeration from the first throw.
//!
//! The first bearing defines an angular cone `[angle - τ, angle + τ]`. The
//! sweep walks integer chunks along whichever axis the cone is least aligned
//! with, so each step only spans a short interval on the other axis, and
//! keeps the chunks that lie between the two cone edges. Each survivor is
//! weighted by the radial prior density sampled inside the chunk.

use crate::angle::{chunk_center_blocks, heading_direction};
use crate::density::DensityField;
use crate::rings::{max_stronghold_distance_blocks, MAX_CHUNK};
use crate::sigma::SigmaSettings;
use crate::types::{EyeThrow, Prediction};
use log::debug;
use serde::Deserialize;
use std::collections::HashSet;

/// Parameters of the first-throw cone sweep.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CandidateOptions {
    /// Cone half-width as a multiple of the first throw's sigma.
    pub cone_sigma_multiplier: f64,
    /// Upper bound on the cone half-width (degrees).
    pub cone_cap_deg: f64,
    /// How far along the bearing the sweep walks (blocks).
    pub sweep_range_blocks: f64,
    /// Density samples per axis when weighting a chunk.
    pub prior_samples_per_axis: usize,
}

impl Default for CandidateOptions {
    fn default() -> Self {
        Self {
            cone_sigma_multiplier: 30.0,
            cone_cap_deg: 1.0,
            sweep_range_blocks: 5000.0,
            prior_samples_per_axis: 2,
        }
    }
}

impl CandidateOptions {
    /// Cone half-width `τ` in radians for a throw with sigma `sigma_deg`.
    pub fn cone_tolerance_rad(&self, sigma_deg: f64) -> f64 {
        (self.cone_sigma_multiplier * sigma_deg)
            .min(self.cone_cap_deg)
            .to_radians()
    }
}

/// Enumerates candidate chunks for `throws[0]` with their (unnormalised)
/// prior weights. `None` when there is no throw or nothing survives.
pub fn generate_candidates(
    throws: &[EyeThrow],
    sigmas: &SigmaSettings,
    options: &CandidateOptions,
) -> Option<Vec<Prediction>> {
    let first = throws.first()?;
    let tolerance = options.cone_tolerance_rad(sigmas.sigma_for(first.kind));
    let max_distance = max_stronghold_distance_blocks(first.x, first.z);
    let field = DensityField::shared();

    let chunks = sweep_cone_chunks(first, tolerance, options.sweep_range_blocks);
    let swept = chunks.len();
    let candidates: Vec<Prediction> = chunks
        .into_iter()
        .filter_map(|(cx, cz)| {
            let dx = chunk_center_blocks(cx) - first.x;
            let dz = chunk_center_blocks(cz) - first.z;
            if (dx * dx + dz * dz).sqrt() > max_distance {
                return None;
            }
            let weight = prior_weight(field, cx, cz, options.prior_samples_per_axis);
            (weight > 0.0 && weight.is_finite()).then(|| Prediction::new(cx, cz, weight))
        })
        .collect();

    debug!(
        "candidates: tau={:.5} rad swept={} kept={} max_dist={:.1}",
        tolerance,
        swept,
        candidates.len(),
        max_distance
    );
    (!candidates.is_empty()).then_some(candidates)
}

/// Mean prior density over an `n×n` sub-grid spanning the chunk.
pub fn prior_weight(field: &DensityField, chunk_x: i32, chunk_z: i32, samples_per_axis: usize) -> f64 {
    let cx = f64::from(chunk_x);
    let cz = f64::from(chunk_z);
    if samples_per_axis <= 1 {
        return field.density_at(cx, cz);
    }
    let step = 1.0 / (samples_per_axis as f64 - 1.0);
    let mut total = 0.0;
    for k in 0..samples_per_axis {
        let x = cx - 0.5 + k as f64 * step;
        for l in 0..samples_per_axis {
            let z = cz - 0.5 + l as f64 * step;
            total += field.density_at(x, z);
        }
    }
    total / (samples_per_axis * samples_per_axis) as f64
}

/// Sweep geometry expressed on the (major, minor) axes.
struct ConeSweep {
    major_x: bool,
    major_positive: bool,
    right_positive: bool,
    origin_major: f64,
    origin_minor: f64,
    slope_u: f64,
    slope_v: f64,
}

/// Integer chunks inside the cone of `throw`, in sweep order.
pub fn sweep_cone_chunks(throw: &EyeThrow, tolerance_rad: f64, range_blocks: f64) -> Vec<(i32, i32)> {
    let phi = throw.angle_deg.to_radians();
    let (dx, dz) = heading_direction(phi);
    let (ux, uz) = heading_direction(phi - tolerance_rad);
    let (vx, vz) = heading_direction(phi + tolerance_rad);

    let major_x = phi.cos() * phi.cos() < 0.5;
    let major_positive = if major_x { dx > 0.0 } else { dz > 0.0 };
    let (major_block, minor_block) = if major_x {
        (throw.x, throw.z)
    } else {
        (throw.z, throw.x)
    };
    let origin_major = (major_block - 8.0) / 16.0;
    let origin_minor = (minor_block - 8.0) / 16.0;

    let slope_u = if major_x { uz / ux } else { ux / uz };
    let slope_v = if major_x { vz / vx } else { vx / vz };
    let sweep = ConeSweep {
        major_x,
        major_positive,
        right_positive: if major_positive {
            slope_v - slope_u > 0.0
        } else {
            slope_u - slope_v > 0.0
        },
        origin_major,
        origin_minor,
        slope_u,
        slope_v,
    };

    let start = iteration_start_major(&sweep, (ux, uz), (vx, vz));
    let d_major = if major_x { dx } else { dz };
    let range = range_blocks / 16.0;
    let step = if major_positive { 1 } else { -1 };

    let mut i = if major_positive {
        start.ceil()
    } else {
        start.floor()
    } as i32;
    let mut seen: HashSet<u64> = HashSet::new();
    let mut out = Vec::new();
    while (f64::from(i) - start) / d_major < range {
        sweep_minor_row(&sweep, i, &mut seen, &mut out);
        i += step;
    }
    out
}

fn sweep_minor_row(sweep: &ConeSweep, i: i32, seen: &mut HashSet<u64>, out: &mut Vec<(i32, i32)>) {
    let offset = f64::from(i) - sweep.origin_major;
    let limit = f64::from(MAX_CHUNK + 1);
    let minor_u = (sweep.origin_minor + sweep.slope_u * offset).clamp(-limit, limit);
    let minor_v = (sweep.origin_minor + sweep.slope_v * offset).clamp(-limit, limit);
    if minor_u.is_nan() || minor_v.is_nan() {
        return;
    }

    let mut j = if sweep.right_positive {
        minor_u.ceil()
    } else {
        minor_u.floor()
    } as i32;
    j = j.clamp(-MAX_CHUNK, MAX_CHUNK);
    loop {
        let inside = if sweep.right_positive {
            f64::from(j) < minor_v && j <= MAX_CHUNK
        } else {
            f64::from(j) > minor_v && j >= -MAX_CHUNK
        };
        if !inside {
            break;
        }
        let (cx, cz) = if sweep.major_x { (i, j) } else { (j, i) };
        if (-MAX_CHUNK..=MAX_CHUNK).contains(&cx)
            && (-MAX_CHUNK..=MAX_CHUNK).contains(&cz)
            && seen.insert(chunk_key(cx, cz))
        {
            out.push((cx, cz));
        }
        j += if sweep.right_positive { 1 } else { -1 };
    }
}

#[inline]
fn chunk_key(x: i32, z: i32) -> u64 {
    (u64::from(x as u32) << 32) | u64::from(z as u32)
}

/// Major-axis coordinate where the sweep starts. Throws outside the
/// stronghold disc start where the cone first enters it.
fn iteration_start_major(sweep: &ConeSweep, u: (f64, f64), v: (f64, f64)) -> f64 {
    let o_major = sweep.origin_major;
    let o_minor = sweep.origin_minor;
    let max_chunk = f64::from(MAX_CHUNK);
    if o_major * o_major + o_minor * o_minor <= max_chunk * max_chunk {
        return o_major;
    }

    let (ox, oz) = if sweep.major_x {
        (o_major, o_minor)
    } else {
        (o_minor, o_major)
    };
    let u_orth = orthogonal_component((-ox, -oz), u);
    let v_orth = orthogonal_component((-ox, -oz), v);

    // Origin direction lies inside the cone: enter at the disc point closest
    // to the player.
    if u_orth > 0.0 && v_orth < 0.0 {
        let o_mag = (ox * ox + oz * oz).sqrt();
        if o_mag <= 1e-12 {
            return o_major;
        }
        let ix = ox / o_mag * max_chunk;
        let iz = oz / o_mag * max_chunk;
        let m1 = o_major + project_major((ix - ox, iz - oz), u, sweep.major_x);
        let m2 = o_major + project_major((ix - ox, iz - oz), v, sweep.major_x);
        return if sweep.major_positive ^ (m1 > m2) { m1 } else { m2 };
    }

    let hit_u = circle_entry_major((ox, oz), u, max_chunk, sweep.major_x);
    let hit_v = circle_entry_major((ox, oz), v, max_chunk, sweep.major_x);
    match (hit_u, hit_v) {
        (Some(a), Some(b)) => {
            if sweep.major_positive ^ (a > b) {
                a
            } else {
                b
            }
        }
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => o_major,
    }
}

fn orthogonal_component(a: (f64, f64), u: (f64, f64)) -> f64 {
    let parallel = u.0 * a.0 + u.1 * a.1;
    let orth_x = u.0 * parallel - a.0;
    let orth_z = u.1 * parallel - a.1;
    u.1 * orth_x - u.0 * orth_z
}

fn project_major(a: (f64, f64), u: (f64, f64), major_x: bool) -> f64 {
    let magnitude = a.0 * u.0 + a.1 * u.1;
    if major_x {
        u.0 * magnitude
    } else {
        u.1 * magnitude
    }
}

/// First intersection of the ray `o + t·u` with the circle of `radius`.
fn circle_entry_major(o: (f64, f64), u: (f64, f64), radius: f64, major_x: bool) -> Option<f64> {
    let o_dot_u = o.0 * u.0 + o.1 * u.1;
    let disc = o_dot_u * o_dot_u + radius * radius - o.0 * o.0 - o.1 * o.1;
    if disc < 0.0 {
        return None;
    }
    let t = -o_dot_u - disc.sqrt();
    if t < 0.0 {
        return None;
    }
    let major = if major_x { o.0 + t * u.0 } else { o.1 + t * u.1 };
    (major != 0.0).then_some(major)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::{bearing_to_chunk_deg, signed_residual_deg};
    use crate::types::ThrowKind;

    #[test]
    fn no_throws_means_no_candidates() {
        let out = generate_candidates(&[], &SigmaSettings::default(), &CandidateOptions::default());
        assert!(out.is_none());
    }

    #[test]
    fn tolerance_is_capped() {
        let opts = CandidateOptions::default();
        assert!((opts.cone_tolerance_rad(0.01) - 0.3f64.to_radians()).abs() < 1e-12);
        assert_eq!(opts.cone_tolerance_rad(0.1), 1.0f64.to_radians());
        assert_eq!(opts.cone_tolerance_rad(1.0), 1.0f64.to_radians());
    }

    #[test]
    fn first_throw_cone_follows_the_bearing() {
        let throw = EyeThrow::new(0.0, 0.0, 0.0, ThrowKind::Normal);
        let opts = CandidateOptions::default();
        let tau_deg = opts.cone_tolerance_rad(0.1).to_degrees();
        let candidates = generate_candidates(&[throw], &SigmaSettings::default(), &opts)
            .expect("angle 0 from the origin points into ring 0");
        assert!(!candidates.is_empty());
        for c in &candidates {
            assert!(c.chunk_z > 0, "chunk {:?} behind the player", c.chunk());
            let gamma = bearing_to_chunk_deg(c.chunk_x, c.chunk_z, throw.x, throw.z);
            assert!(
                signed_residual_deg(gamma, throw.angle_deg).abs() <= tau_deg + 1.0,
                "chunk {:?} outside cone",
                c.chunk()
            );
            assert!(c.certainty > 0.0);
        }
    }

    #[test]
    fn sweep_handles_every_octant() {
        for angle in [-170.0, -120.0, -60.0, -10.0, 30.0, 80.0, 135.0, 179.0] {
            let throw = EyeThrow::new(1000.0, -2000.0, angle, ThrowKind::Normal);
            let chunks = sweep_cone_chunks(&throw, 0.05, 5000.0);
            assert!(!chunks.is_empty(), "angle={angle}");
            let unique: HashSet<(i32, i32)> = chunks.iter().copied().collect();
            assert_eq!(unique.len(), chunks.len());
        }
    }

    #[test]
    fn throw_outside_disc_starts_at_its_edge() {
        let far = f64::from(MAX_CHUNK + 200) * 16.0;
        let inward = EyeThrow::new(0.0, far, 180.0, ThrowKind::Normal);
        let chunks = sweep_cone_chunks(&inward, 0.05, 5000.0);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|&(_, z)| z <= MAX_CHUNK));
        let outward = EyeThrow::new(0.0, far, 0.0, ThrowKind::Normal);
        assert!(sweep_cone_chunks(&outward, 0.05, 5000.0).is_empty());
    }
}
