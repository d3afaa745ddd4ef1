//! Per-kind measurement noise, as resolved by the settings collaborator.

use crate::types::ThrowKind;
use serde::Deserialize;

/// Standard deviations (degrees) of each throw kind.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SigmaSettings {
    pub normal: f64,
    pub normal_alt: f64,
    pub manual: f64,
    pub boat: f64,
}

impl Default for SigmaSettings {
    fn default() -> Self {
        Self {
            normal: 0.1,
            normal_alt: 0.1,
            manual: 0.03,
            boat: 0.001,
        }
    }
}

impl SigmaSettings {
    /// Applies the ranges accepted from user preferences.
    pub fn clamped(self) -> Self {
        Self {
            normal: clamp_or(self.normal, 0.001, 1.0, Self::default().normal),
            normal_alt: clamp_or(self.normal_alt, 0.001, 1.0, Self::default().normal_alt),
            manual: clamp_or(self.manual, 0.001, 1.0, Self::default().manual),
            boat: clamp_or(self.boat, 0.0001, 1.0, Self::default().boat),
        }
    }

    #[inline]
    pub fn sigma_for(&self, kind: ThrowKind) -> f64 {
        match kind {
            ThrowKind::Normal => self.normal,
            ThrowKind::NormalAltStd => self.normal_alt,
            ThrowKind::Manual => self.manual,
            ThrowKind::Boat => self.boat,
        }
    }
}

fn clamp_or(value: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_preference_ranges() {
        let s = SigmaSettings {
            normal: 5.0,
            normal_alt: 0.0,
            manual: f64::NAN,
            boat: 0.00001,
        }
        .clamped();
        assert_eq!(s.normal, 1.0);
        assert_eq!(s.normal_alt, 0.001);
        assert_eq!(s.manual, 0.03);
        assert_eq!(s.boat, 0.0001);
    }

    #[test]
    fn kind_selects_sigma() {
        let s = SigmaSettings::default();
        assert_eq!(s.sigma_for(ThrowKind::Boat), 0.001);
        assert_eq!(s.sigma_for(ThrowKind::Manual), 0.03);
    }
}
