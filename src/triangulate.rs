//! Weighted least-squares intersection of throw bearings.
//!
//! Each throw contributes the line through its position with normal
//! `n = (-dz, dx)`. The intersection minimises `Σ w·(n·x - n·p)²`, solved
//! from the 2×2 normal equations, and the chunk is then refined by a local
//! integer search on the angular objective so near-parallel throws do not
//! land in the wrong chunk.

use crate::angle::heading_direction;
use crate::posterior::angle_objective;
use crate::sigma::SigmaSettings;
use crate::types::EyeThrow;
use log::{debug, warn};
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TriangulationOptions {
    /// Half-width of the integer search window (chunks).
    pub search_radius_chunks: i32,
    pub min_weight: f64,
    pub max_weight: f64,
    /// Normal equations with `|det|` below this are treated as singular.
    pub determinant_epsilon: f64,
}

impl Default for TriangulationOptions {
    fn default() -> Self {
        Self {
            search_radius_chunks: 12,
            min_weight: 1.0,
            max_weight: 1e6,
            determinant_epsilon: 1e-9,
        }
    }
}

/// Triangulated stronghold chunk.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Triangulation {
    pub chunk_x: i32,
    pub chunk_z: i32,
    /// Continuous least-squares intersection in blocks.
    pub intersection_x: f64,
    pub intersection_z: f64,
    /// Angular objective at the selected chunk.
    pub objective: f64,
}

impl Triangulation {
    #[inline]
    pub fn chunk(&self) -> (i32, i32) {
        (self.chunk_x, self.chunk_z)
    }
}

#[derive(Default)]
struct NormalEquationAccum {
    ata: Matrix2<f64>,
    atb: Vector2<f64>,
}

impl NormalEquationAccum {
    fn accumulate(&mut self, throw: &EyeThrow, weight: f64) {
        let (dx, dz) = heading_direction(throw.angle_deg.to_radians());
        let normal = Vector2::new(-dz, dx);
        let offset = normal.dot(&Vector2::new(throw.x, throw.z));
        self.ata += normal * normal.transpose() * weight;
        self.atb += normal * (offset * weight);
    }

    fn determinant(&self) -> f64 {
        self.ata[(0, 0)] * self.ata[(1, 1)] - self.ata[(0, 1)] * self.ata[(1, 0)]
    }

    fn solve(&self, det: f64) -> Vector2<f64> {
        let adjugate = Matrix2::new(
            self.ata[(1, 1)],
            -self.ata[(0, 1)],
            -self.ata[(1, 0)],
            self.ata[(0, 0)],
        );
        adjugate * self.atb / det
    }
}

/// Triangulates the stronghold chunk from two or more throws.
pub fn triangulate(
    throws: &[EyeThrow],
    sigmas: &SigmaSettings,
    options: &TriangulationOptions,
) -> Option<Triangulation> {
    if throws.len() < 2 {
        return None;
    }
    let mut accum = NormalEquationAccum::default();
    for throw in throws {
        let sigma = sigmas.sigma_for(throw.kind);
        let weight = (1.0 / (sigma * sigma).max(1e-8)).clamp(options.min_weight, options.max_weight);
        accum.accumulate(throw, weight);
    }

    let det = accum.determinant();
    if !det.is_finite() || det.abs() < options.determinant_epsilon {
        warn!("triangulation: normal equations are singular (det={det:e})");
        return None;
    }
    let intersection = accum.solve(det);
    if !intersection.iter().all(|v| v.is_finite()) {
        return None;
    }

    let centre_x = ((intersection.x - 8.0) / 16.0).floor() as i32;
    let centre_z = ((intersection.y - 8.0) / 16.0).floor() as i32;
    let radius = options.search_radius_chunks.max(0);
    let mut best = (centre_x, centre_z);
    let mut best_objective = f64::INFINITY;
    for dz in -radius..=radius {
        for dx in -radius..=radius {
            let chunk = (centre_x + dx, centre_z + dz);
            let objective = angle_objective(chunk, throws, sigmas);
            if objective < best_objective {
                best_objective = objective;
                best = chunk;
            }
        }
    }
    if !best_objective.is_finite() {
        return None;
    }
    debug!(
        "triangulation: intersection=({:.1}, {:.1}) chunk={:?} objective={:.4}",
        intersection.x, intersection.y, best, best_objective
    );
    Some(Triangulation {
        chunk_x: best.0,
        chunk_z: best.1,
        intersection_x: intersection.x,
        intersection_z: intersection.y,
        objective: best_objective,
    })
}
