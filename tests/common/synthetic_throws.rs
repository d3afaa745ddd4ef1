use stronghold_resolver::angle::bearing_to_chunk_deg;
use stronghold_resolver::{EyeThrow, Prediction, ThrowKind};

/// Throw from `(x, z)` aimed exactly at the centre of `chunk`.
pub fn aimed_throw(x: f64, z: f64, chunk: (i32, i32), kind: ThrowKind) -> EyeThrow {
    EyeThrow::new(x, z, bearing_to_chunk_deg(chunk.0, chunk.1, x, z), kind)
}

/// One normal throw per position, all aimed at `chunk`.
pub fn throws_towards(chunk: (i32, i32), positions: &[(f64, f64)]) -> Vec<EyeThrow> {
    positions
        .iter()
        .map(|&(x, z)| aimed_throw(x, z, chunk, ThrowKind::Normal))
        .collect()
}

/// Equal-weight prior over the square of chunks within `half_width` of
/// `centre`.
pub fn uniform_prior(centre: (i32, i32), half_width: i32) -> Vec<Prediction> {
    let side = (2 * half_width + 1) as usize;
    let weight = 1.0 / (side * side) as f64;
    let mut prior = Vec::with_capacity(side * side);
    for dx in -half_width..=half_width {
        for dz in -half_width..=half_width {
            prior.push(Prediction::new(centre.0 + dx, centre.1 + dz, weight));
        }
    }
    prior
}

pub fn certainty_sum(predictions: &[Prediction]) -> f64 {
    predictions.iter().map(|p| p.certainty).sum()
}
