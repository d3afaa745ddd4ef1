//! Radial prior density of stronghold positions.
//!
//! The raw density spreads each ring's strongholds uniformly over its annulus
//! (trapezoid-halved at the two boundary bins). Structure snapping then moves
//! each stronghold by a discrete offset in `[-7, 7]²` chunks, so the raw
//! profile is convolved with an isotropic 1-D kernel obtained by projecting
//! every weighted offset pair onto the radial axis at 200 sample angles.
//!
//! `cumulative_polar[i]` integrates `density·2πr` up to bin `i`, i.e. the
//! expected number of strongholds within `i` chunks of the origin.

use crate::rings::{rings, RingInfo, MAX_CHUNK, SNAPPING_RADIUS};
use std::f64::consts::{PI, SQRT_2};
use std::sync::OnceLock;

const KERNEL_ANGLE_SAMPLES: usize = 200;

/// Memoized radial density tables indexed by integer chunk radius.
#[derive(Clone, Debug)]
pub struct DensityField {
    density: Vec<f64>,
    cumulative_polar: Vec<f64>,
}

impl DensityField {
    /// Process-wide table, built on first use.
    pub fn shared() -> &'static DensityField {
        static FIELD: OnceLock<DensityField> = OnceLock::new();
        FIELD.get_or_init(|| DensityField::build(rings()))
    }

    /// Builds the tables from a ring description.
    pub fn build(rings: &[RingInfo]) -> Self {
        let length = (MAX_CHUNK + 5) as usize;
        let raw = raw_density(rings, length);
        let kernel = snapping_kernel();
        let density = convolve_symmetric(&raw, &kernel);

        let mut cumulative_polar = Vec::with_capacity(length);
        let mut cumsum = 0.0;
        for (i, rho) in density.iter().enumerate() {
            cumsum += rho * i as f64 * 2.0 * PI;
            cumulative_polar.push(cumsum);
        }
        Self {
            density,
            cumulative_polar,
        }
    }

    pub fn len(&self) -> usize {
        self.density.len()
    }

    pub fn is_empty(&self) -> bool {
        self.density.is_empty()
    }

    pub fn density(&self) -> &[f64] {
        &self.density
    }

    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative_polar
    }

    /// Interpolated density at a (fractional) chunk position. Zero outside
    /// the table.
    pub fn density_at(&self, chunk_x: f64, chunk_z: f64) -> f64 {
        let k = (chunk_x * chunk_x + chunk_z * chunk_z).sqrt();
        if !k.is_finite() {
            return 0.0;
        }
        let i0 = k as usize;
        let i1 = i0 + 1;
        if i1 >= self.density.len() {
            return 0.0;
        }
        let t = k - i0 as f64;
        let (d0, d1) = (self.density[i0], self.density[i1]);
        d0 + t * (d1 - d0)
    }

    /// Interpolated expected stronghold count within `radius` chunks.
    /// Clamped to the last entry beyond the table.
    pub fn cumulative_polar(&self, radius: f64) -> f64 {
        if !(radius >= 0.0) {
            return 0.0;
        }
        let Some(&last) = self.cumulative_polar.last() else {
            return 0.0;
        };
        let i0 = radius as usize;
        let i1 = i0 + 1;
        if i1 >= self.cumulative_polar.len() {
            return last;
        }
        let t = radius - i0 as f64;
        let (c0, c1) = (self.cumulative_polar[i0], self.cumulative_polar[i1]);
        // Exact on flat segments and never past the upper knot.
        (c0 + t * (c1 - c0)).min(c1)
    }
}

fn raw_density(rings: &[RingInfo], length: usize) -> Vec<f64> {
    let mut raw = vec![0.0f64; length];
    for ring in rings {
        let c0 = ring.inner_radius as usize;
        let c1 = ring.outer_radius as usize;
        let width = ring.outer_radius - ring.inner_radius;
        for i in c0..=c1.min(length.saturating_sub(1)) {
            if i == 0 {
                continue;
            }
            let mut rho = f64::from(ring.strongholds_in_ring) / (2.0 * PI * width * i as f64);
            if i == c0 || i == c1 {
                rho *= 0.5;
            }
            raw[i] = rho;
        }
    }
    raw
}

/// How often each per-axis snapping offset occurs on the generator's grid.
fn snapping_offset_weights() -> [u32; (2 * SNAPPING_RADIUS + 1) as usize] {
    let mut weights = [0u32; (2 * SNAPPING_RADIUS + 1) as usize];
    for i in -26i32..=30 {
        let offset = -i.div_euclid(4);
        let idx = offset + SNAPPING_RADIUS;
        if (0..weights.len() as i32).contains(&idx) {
            weights[idx as usize] += 1;
        }
    }
    weights
}

/// One-sided radial kernel `filter[|dr|]`, normalised so the two-sided
/// kernel sums to one.
fn snapping_kernel() -> Vec<f64> {
    let radius = (f64::from(SNAPPING_RADIUS) * SQRT_2).ceil() as usize;
    let weights = snapping_offset_weights();
    let mut filter = vec![0.0f64; radius + 1];
    let mut sum = 0.0;
    for (ki, &wx) in weights.iter().enumerate() {
        let k = ki as i32 - SNAPPING_RADIUS;
        for (li, &wz) in weights.iter().enumerate() {
            let l = li as i32 - SNAPPING_RADIUS;
            let w = f64::from(wx * wz);
            let radial = f64::from(k * k + l * l).sqrt();
            for s in 0..KERNEL_ANGLE_SAMPLES {
                let phi = 2.0 * PI * s as f64 / KERNEL_ANGLE_SAMPLES as f64;
                let dr = ((radial * phi.sin()).round().abs() as usize).min(radius);
                filter[dr] += w;
                sum += if dr == 0 { w } else { 2.0 * w };
            }
        }
    }
    if sum > 0.0 {
        for v in &mut filter {
            *v /= sum;
        }
    }
    filter
}

fn convolve_symmetric(signal: &[f64], half_kernel: &[f64]) -> Vec<f64> {
    let radius = half_kernel.len() as isize - 1;
    let n = signal.len() as isize;
    (0..n)
        .map(|i| {
            let mut acc = 0.0;
            for j in -radius..=radius {
                let src = i + j;
                if src < 0 || src >= n {
                    continue;
                }
                acc += signal[src as usize] * half_kernel[j.unsigned_abs()];
            }
            acc
        })
        .collect()
}
