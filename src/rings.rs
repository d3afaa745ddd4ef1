//! Static geometry of the stronghold placement rings.
//!
//! The world generator spreads 128 strongholds over 8 concentric rings. Ring
//! `i` is centred on `32·(4 + 6i)` chunks with a half-width of `32·1.25`, and
//! structure snapping can move a stronghold by up to 7 chunks along each axis,
//! so the post-snapping annulus is padded by `(7 + 1)·√2` on both sides.
//!
//! The table is built once per process and is read-only afterwards.

use serde::Serialize;
use std::f64::consts::{PI, SQRT_2};
use std::sync::OnceLock;

pub const STRONGHOLD_COUNT: u32 = 128;
pub const RING_COUNT: usize = 8;
/// Ring spacing parameter, in chunks.
pub const DISTANCE_PARAM: f64 = 32.0;
/// Per-axis structure snapping jitter, in chunks.
pub const SNAPPING_RADIUS: i32 = 7;
/// Chunk radius beyond which no stronghold can generate.
pub const MAX_CHUNK: i32 = (DISTANCE_PARAM * ((4.0 + (RING_COUNT as f64 - 1.0) * 6.0) + 1.25))
    as i32
    + 2 * SNAPPING_RADIUS
    + 1;
/// Search distance used when the ring bound is unavailable, in blocks.
pub const FALLBACK_MAX_DISTANCE_BLOCKS: f64 = 5000.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RingInfo {
    pub ring_index: usize,
    pub strongholds_in_ring: u32,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub inner_radius_post_snapping: f64,
    pub outer_radius_post_snapping: f64,
}

impl RingInfo {
    /// True when `chunk_radius` lies inside the post-snapping annulus.
    #[inline]
    pub fn contains_post_snapping(&self, chunk_radius: f64) -> bool {
        chunk_radius >= self.inner_radius_post_snapping
            && chunk_radius <= self.outer_radius_post_snapping
    }

    /// Angular spacing between neighbouring strongholds of this ring.
    #[inline]
    pub fn slot_spacing_rad(&self) -> f64 {
        2.0 * PI / f64::from(self.strongholds_in_ring)
    }
}

/// Builds the ring table. Deterministic and pure.
pub fn build_rings() -> Vec<RingInfo> {
    let mut rings = Vec::with_capacity(RING_COUNT);
    let mut per_ring: u32 = 1;
    let mut placed: u32 = 0;
    let pad = (f64::from(SNAPPING_RADIUS) + 1.0) * SQRT_2;
    for ring_index in 0..RING_COUNT {
        per_ring += (2 * per_ring) / (ring_index as u32 + 1);
        per_ring = per_ring.min(STRONGHOLD_COUNT - placed);
        placed += per_ring;

        let centre = 4.0 + ring_index as f64 * 6.0;
        let inner_radius = DISTANCE_PARAM * (centre - 1.25);
        let outer_radius = DISTANCE_PARAM * (centre + 1.25);
        rings.push(RingInfo {
            ring_index,
            strongholds_in_ring: per_ring,
            inner_radius,
            outer_radius,
            inner_radius_post_snapping: inner_radius - pad,
            outer_radius_post_snapping: outer_radius + pad,
        });
    }
    rings
}

/// Process-wide ring table.
pub fn rings() -> &'static [RingInfo] {
    static RINGS: OnceLock<Vec<RingInfo>> = OnceLock::new();
    RINGS.get_or_init(build_rings)
}

/// Ring whose post-snapping annulus contains `chunk_radius`.
pub fn ring_for_chunk_radius(chunk_radius: f64) -> Option<&'static RingInfo> {
    rings()
        .iter()
        .find(|ring| ring.contains_post_snapping(chunk_radius))
}

/// Upper bound, in blocks, on the distance from a throw position to the
/// nearest stronghold.
///
/// Every ring holds a stronghold within half a slot of any azimuth, so the
/// chord from the player to that worst-placed slot bounds the distance; the
/// tightest ring wins and the result is padded by the snapping radius.
pub fn max_stronghold_distance_blocks(x: f64, z: f64) -> f64 {
    let table = rings();
    if table.is_empty() {
        return FALLBACK_MAX_DISTANCE_BLOCKS;
    }
    let player_r = (x * x + z * z).sqrt() / 16.0;
    let mut max_chunks = f64::INFINITY;
    for ring in table {
        let cos_half_slot = (PI / f64::from(ring.strongholds_in_ring)).cos();
        let chord_sq = |radius: f64| {
            radius * radius + player_r * player_r - 2.0 * player_r * radius * cos_half_slot
        };
        let candidate = chord_sq(ring.inner_radius)
            .max(chord_sq(ring.outer_radius))
            .sqrt();
        if candidate < max_chunks {
            max_chunks = candidate;
        }
    }
    if !max_chunks.is_finite() {
        return FALLBACK_MAX_DISTANCE_BLOCKS;
    }
    (max_chunks + SQRT_2 * (f64::from(SNAPPING_RADIUS) + 0.5)) * 16.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_counts_cover_every_stronghold() {
        let counts: Vec<u32> = rings().iter().map(|r| r.strongholds_in_ring).collect();
        assert_eq!(counts, vec![3, 6, 10, 15, 21, 28, 36, 9]);
        assert_eq!(counts.iter().sum::<u32>(), STRONGHOLD_COUNT);
    }

    #[test]
    fn uncapped_ring_counts_are_non_decreasing() {
        let table = rings();
        let mut placed = 0;
        for pair in table.windows(2) {
            placed += pair[0].strongholds_in_ring;
            let remaining = STRONGHOLD_COUNT - placed;
            if pair[1].strongholds_in_ring < remaining {
                assert!(pair[1].strongholds_in_ring >= pair[0].strongholds_in_ring);
            } else {
                assert_eq!(pair[1].strongholds_in_ring, remaining);
            }
        }
    }

    #[test]
    fn radii_follow_ring_spacing() {
        let first = rings()[0];
        assert_eq!(first.inner_radius, 88.0);
        assert_eq!(first.outer_radius, 168.0);
        let pad = 8.0 * SQRT_2;
        assert!((first.inner_radius_post_snapping - (88.0 - pad)).abs() < 1e-12);
        assert!((first.outer_radius_post_snapping - (168.0 + pad)).abs() < 1e-12);
        assert_eq!(MAX_CHUNK, 1527);
    }

    #[test]
    fn ring_lookup_uses_post_snapping_bounds() {
        assert_eq!(ring_for_chunk_radius(120.0).map(|r| r.ring_index), Some(0));
        assert_eq!(ring_for_chunk_radius(80.0).map(|r| r.ring_index), Some(0));
        assert!(ring_for_chunk_radius(40.0).is_none());
        assert!(ring_for_chunk_radius(250.0).is_none());
        assert_eq!(ring_for_chunk_radius(320.0).map(|r| r.ring_index), Some(1));
    }

    #[test]
    fn distance_bound_is_finite_and_grows_with_ring_gap() {
        let at_origin = max_stronghold_distance_blocks(0.0, 0.0);
        assert!(at_origin.is_finite() && at_origin > 168.0 * 16.0);
        let in_ring = max_stronghold_distance_blocks(128.0 * 16.0, 0.0);
        assert!(in_ring < at_origin);
    }
}
