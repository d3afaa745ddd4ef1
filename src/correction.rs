//! Conversion of raw in-game yaw readings into throw angles, plus the step
//! used when nudging a throw by hand.

use crate::types::{EyeThrow, ThrowKind};
use serde::Deserialize;

/// Sensitivity assumed when the game options are unavailable.
pub const DEFAULT_SENSITIVITY: f64 = 0.012727597;

/// Increments accepted when validating the boat's initial yaw.
const BOAT_INIT_POSITIVE_INCREMENT_DEG: f64 = 1.40625;
const BOAT_INIT_NEGATIVE_INCREMENT_DEG: f64 = 0.140625;
const BOAT_INIT_ERROR_LIMIT_DEG: f64 = 0.03;

/// Mouse-derived settings used for boat measurements.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoatAngleSettings {
    pub sensitivity: f64,
    pub crosshair_correction_deg: f64,
}

impl Default for BoatAngleSettings {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            crosshair_correction_deg: 0.0,
        }
    }
}

impl BoatAngleSettings {
    pub fn clamped(self) -> Self {
        let defaults = Self::default();
        Self {
            sensitivity: finite_or(self.sensitivity, defaults.sensitivity).clamp(0.0, 1.0),
            crosshair_correction_deg: finite_or(self.crosshair_correction_deg, 0.0).clamp(-1.0, 1.0),
        }
    }

    /// Yaw change (degrees) produced by one mouse count.
    pub fn yaw_per_mouse_count(&self) -> f64 {
        yaw_degrees_per_mouse_count(self.sensitivity)
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Yaw change (degrees) per mouse count at `sensitivity`.
pub fn yaw_degrees_per_mouse_count(sensitivity: f64) -> f64 {
    let pre = sensitivity * 0.6 + 0.2;
    pre * pre * pre * 8.0 * 0.15
}

/// Applies the crosshair offset and the game's small sinusoidal yaw bias.
pub fn corrected_horizontal_angle(angle_deg: f64, crosshair_correction_deg: f64) -> f64 {
    let alpha = angle_deg + crosshair_correction_deg;
    alpha - 0.000824 * (alpha + 45.0).to_radians().sin()
}

/// Snaps a yaw reading onto the mouse-count lattice anchored at the boat
/// angle, then corrects it.
pub fn precise_boat_angle(angle_deg: f64, settings: &BoatAngleSettings, boat_angle_deg: f64) -> f64 {
    let increment = settings.yaw_per_mouse_count();
    let snapped = boat_angle_deg + ((angle_deg - boat_angle_deg) / increment).round() * increment;
    corrected_horizontal_angle(snapped, settings.crosshair_correction_deg)
}

/// Validates the yaw recorded while seated in a boat. The boat snaps to
/// 1.40625° (or 0.140625° for negative readings); a reading that does not
/// land on that lattice within 0.03° is rejected.
pub fn resolve_boat_init_angle(raw_deg: f64) -> Option<f32> {
    if !raw_deg.is_finite() || raw_deg.abs() > 360.0 {
        return None;
    }
    let increment = if raw_deg >= 0.0 {
        BOAT_INIT_POSITIVE_INCREMENT_DEG
    } else {
        BOAT_INIT_NEGATIVE_INCREMENT_DEG
    };
    let candidate = ((raw_deg / increment).round() * increment) as f32;
    let rounded = (f64::from(candidate) * 100.0).round() / 100.0;
    ((rounded - raw_deg).abs() <= BOAT_INIT_ERROR_LIMIT_DEG).then_some(candidate)
}

/// Turns a throw carrying a raw yaw reading into a measured throw. Boat
/// throws snap onto the mouse lattice when a validated boat angle is known;
/// every other throw only gets the crosshair and bias correction.
pub fn correct_throw(
    raw: EyeThrow,
    settings: &BoatAngleSettings,
    boat_angle_deg: Option<f32>,
) -> EyeThrow {
    let settings = settings.clamped();
    let angle = match (raw.kind, boat_angle_deg) {
        (ThrowKind::Boat, Some(boat)) => {
            precise_boat_angle(raw.angle_deg, &settings, f64::from(boat))
        }
        _ => corrected_horizontal_angle(raw.angle_deg, settings.crosshair_correction_deg),
    };
    EyeThrow::new(raw.x, raw.z, angle, raw.kind).with_vertical_angle(raw.vertical_angle_deg)
}

/// How large one manual nudge is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AngleAdjustment {
    /// Fixed 0.01°.
    #[default]
    Subpixel,
    /// One pixel on a tall (stretched) resolution.
    Tall { resolution_height: f64 },
    Custom { step: f64 },
}

const SUBPIXEL_STEP_DEG: f64 = 0.01;

impl AngleAdjustment {
    pub fn clamped(self) -> Self {
        match self {
            AngleAdjustment::Subpixel => self,
            AngleAdjustment::Tall { resolution_height } => AngleAdjustment::Tall {
                resolution_height: finite_or(resolution_height, 16384.0).clamp(1.0, 16384.0),
            },
            AngleAdjustment::Custom { step } => AngleAdjustment::Custom {
                step: finite_or(step, SUBPIXEL_STEP_DEG).clamp(0.0001, 1.0),
            },
        }
    }

    /// Nudge size in degrees for a throw taken at `vertical_angle_deg`.
    pub fn step_degrees(&self, vertical_angle_deg: f64) -> f64 {
        match self.clamped() {
            AngleAdjustment::Subpixel => SUBPIXEL_STEP_DEG,
            AngleAdjustment::Tall { resolution_height } => {
                let denominator = vertical_angle_deg.to_radians().cos();
                if denominator.abs() <= 1e-9 {
                    return SUBPIXEL_STEP_DEG;
                }
                let radians =
                    (2.0 * 15.0f64.to_radians().tan() / resolution_height).atan() / denominator;
                let degrees = radians.to_degrees();
                if !degrees.is_finite() || degrees <= 0.0 {
                    SUBPIXEL_STEP_DEG
                } else {
                    degrees
                }
            }
            AngleAdjustment::Custom { step } => step,
        }
    }
}
