//! Angle utilities shared by the resolver stages.
//!
//! Bearings follow the Minecraft yaw convention: 0° looks towards +Z, 90°
//! towards -X, and the heading of a displacement `(dx, dz)` is
//! `-atan2(dx, dz)`.

/// Block offset of the aim point inside a chunk (pre-1.19 chunk centre).
pub const CHUNK_AIM_OFFSET: f64 = 8.0;

/// Wraps an angle in degrees into `(-180, 180]`.
#[inline]
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return degrees;
    }
    let mut wrapped = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        wrapped += 360.0;
    }
    wrapped
}

/// Block coordinate of the aim point of chunk `chunk`.
#[inline]
pub fn chunk_center_blocks(chunk: i32) -> f64 {
    f64::from(chunk) * 16.0 + CHUNK_AIM_OFFSET
}

/// Heading in degrees of the displacement `(dx, dz)`.
#[inline]
pub fn heading_deg(dx: f64, dz: f64) -> f64 {
    (-dx.atan2(dz)).to_degrees()
}

/// Heading in radians of the displacement `(dx, dz)`.
#[inline]
pub fn heading_rad(dx: f64, dz: f64) -> f64 {
    -dx.atan2(dz)
}

/// Heading in degrees from a block position to the aim point of a chunk.
#[inline]
pub fn bearing_to_chunk_deg(chunk_x: i32, chunk_z: i32, from_x: f64, from_z: f64) -> f64 {
    heading_deg(
        chunk_center_blocks(chunk_x) - from_x,
        chunk_center_blocks(chunk_z) - from_z,
    )
}

/// Signed shortest difference `gamma - measured`, wrapped into `(-180, 180]`.
#[inline]
pub fn signed_residual_deg(gamma: f64, measured: f64) -> f64 {
    normalize_degrees(gamma - measured)
}

/// Unit direction `(dx, dz)` of a heading given in radians.
#[inline]
pub fn heading_direction(phi: f64) -> (f64, f64) {
    (-phi.sin(), phi.cos())
}

/// Returns true when two chunks touch, diagonals included.
#[inline]
pub fn are_neighboring_chunks(a: (i32, i32), b: (i32, i32)) -> bool {
    (a.0 - b.0).abs() <= 1 && (a.1 - b.1).abs() <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn normalize_degrees_wraps_into_half_open_range() {
        assert!(approx_eq(normalize_degrees(0.0), 0.0));
        assert!(approx_eq(normalize_degrees(180.0), 180.0));
        assert!(approx_eq(normalize_degrees(-180.0), 180.0));
        assert!(approx_eq(normalize_degrees(190.0), -170.0));
        assert!(approx_eq(normalize_degrees(-190.0), 170.0));
        assert!(approx_eq(normalize_degrees(720.5), 0.5));
    }

    #[test]
    fn heading_follows_yaw_convention() {
        assert!(approx_eq(heading_deg(0.0, 1.0), 0.0));
        assert!(approx_eq(heading_deg(-1.0, 0.0), 90.0));
        assert!(approx_eq(heading_deg(1.0, 0.0), -90.0));
        assert!(approx_eq(heading_deg(0.0, -1.0).abs(), 180.0));
    }

    #[test]
    fn heading_direction_inverts_heading() {
        for deg in [-135.0f64, -30.0, 0.0, 45.0, 170.0] {
            let (dx, dz) = heading_direction(deg.to_radians());
            assert!((heading_deg(dx, dz) - deg).abs() < 1e-9, "deg={deg}");
        }
    }

    #[test]
    fn residual_takes_shortest_arc() {
        assert!(approx_eq(signed_residual_deg(179.0, -179.0), -2.0));
        assert!(approx_eq(signed_residual_deg(-179.0, 179.0), 2.0));
        assert!(approx_eq(signed_residual_deg(10.0, 4.0), 6.0));
    }

    #[test]
    fn neighbors_include_diagonals() {
        assert!(are_neighboring_chunks((10, -20), (11, -20)));
        assert!(are_neighboring_chunks((10, -20), (9, -21)));
        assert!(are_neighboring_chunks((3, 3), (3, 3)));
        assert!(!are_neighboring_chunks((10, -20), (12, -20)));
    }
}
