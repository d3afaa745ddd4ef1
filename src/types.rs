use crate::angle::normalize_degrees;
use crate::guidance::Guidance;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Vertical angle recorded when the capture did not carry one.
pub const DEFAULT_VERTICAL_ANGLE_DEG: f64 = -31.6;

/// Measurement class of a throw; selects the noise sigma.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThrowKind {
    #[default]
    Normal,
    #[serde(rename = "NORMAL_WITH_ALT_STD")]
    NormalAltStd,
    Manual,
    Boat,
}

impl ThrowKind {
    /// Parses an upstream type label. Unknown labels fall back to `Normal`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "NORMAL_WITH_ALT_STD" => ThrowKind::NormalAltStd,
            "MANUAL" => ThrowKind::Manual,
            "BOAT" => ThrowKind::Boat,
            _ => ThrowKind::Normal,
        }
    }
}

/// One eye-of-ender bearing measurement in overworld block space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EyeThrow {
    pub x: f64,
    pub z: f64,
    /// Heading in degrees, `(-180, 180]`.
    pub angle_deg: f64,
    #[serde(default = "default_vertical_angle")]
    pub vertical_angle_deg: f64,
    #[serde(default)]
    pub kind: ThrowKind,
}

fn default_vertical_angle() -> f64 {
    DEFAULT_VERTICAL_ANGLE_DEG
}

impl EyeThrow {
    pub fn new(x: f64, z: f64, angle_deg: f64, kind: ThrowKind) -> Self {
        Self {
            x,
            z,
            angle_deg: normalize_degrees(angle_deg),
            vertical_angle_deg: DEFAULT_VERTICAL_ANGLE_DEG,
            kind,
        }
    }

    pub fn with_vertical_angle(mut self, vertical_angle_deg: f64) -> Self {
        self.vertical_angle_deg = vertical_angle_deg;
        self
    }

    /// Copy of this throw with its heading rotated by `delta_deg`.
    pub fn rotated(&self, delta_deg: f64) -> Self {
        Self {
            angle_deg: normalize_degrees(self.angle_deg + delta_deg),
            ..*self
        }
    }

    /// Distance from the world origin in chunks.
    pub fn radius_chunks(&self) -> f64 {
        (self.x * self.x + self.z * self.z).sqrt() / 16.0
    }

    /// Duplicate check used when logging consecutive captures.
    pub fn is_same_measurement(&self, other: &EyeThrow) -> bool {
        (self.x - other.x).abs() <= 1e-9
            && (self.z - other.z).abs() <= 1e-9
            && (self.angle_deg - other.angle_deg).abs() <= 1e-9
            && self.kind == other.kind
    }
}

/// Posterior weight assigned to one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub certainty: f64,
}

impl Prediction {
    pub fn new(chunk_x: i32, chunk_z: i32, certainty: f64) -> Self {
        Self {
            chunk_x,
            chunk_z,
            certainty,
        }
    }

    #[inline]
    pub fn chunk(&self) -> (i32, i32) {
        (self.chunk_x, self.chunk_z)
    }
}

/// Sorts predictions by descending certainty; NaNs sink to the end.
pub fn sort_by_certainty(predictions: &mut [Prediction]) {
    predictions.sort_by(|a, b| {
        b.certainty
            .partial_cmp(&a.certainty)
            .unwrap_or_else(|| a.certainty.is_nan().cmp(&b.certainty.is_nan()))
    });
}

/// Highest-certainty prediction; ties keep the earliest entry.
pub fn top_prediction(predictions: &[Prediction]) -> Option<Prediction> {
    let mut best: Option<Prediction> = None;
    for p in predictions {
        match best {
            Some(b) if p.certainty.partial_cmp(&b.certainty) != Some(Ordering::Greater) => {}
            _ => best = Some(*p),
        }
    }
    best
}

/// Certainty of a given chunk, if present in the set.
pub fn certainty_of(predictions: &[Prediction], chunk: (i32, i32)) -> Option<f64> {
    predictions
        .iter()
        .find(|p| p.chunk() == chunk)
        .map(|p| p.certainty)
}

/// Result of a full resolve, mirroring what the overlay consumes.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResult {
    pub found: bool,
    /// Ranked predictions, descending certainty.
    pub predictions: Vec<Prediction>,
    pub top: Option<Prediction>,
    /// True when the top certainty is at or below the success threshold.
    pub low_confidence: bool,
    pub native_chunk: Option<(i32, i32)>,
    /// Chunk to navigate to: the top prediction, or the triangulated chunk
    /// when the posterior is empty.
    pub target: Option<(i32, i32)>,
    pub target_from_triangulation: bool,
    pub guidance: Guidance,
    pub latency_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_parse_case_insensitively() {
        assert_eq!(ThrowKind::from_label("boat"), ThrowKind::Boat);
        assert_eq!(
            ThrowKind::from_label("NORMAL_WITH_ALT_STD"),
            ThrowKind::NormalAltStd
        );
        assert_eq!(ThrowKind::from_label(" Manual "), ThrowKind::Manual);
        assert_eq!(ThrowKind::from_label("???"), ThrowKind::Normal);
    }

    #[test]
    fn throw_json_uses_upstream_names() {
        let json = r#"{"x": 10.5, "z": -3.0, "angleDeg": 12.0, "kind": "NORMAL_WITH_ALT_STD"}"#;
        let t: EyeThrow = serde_json::from_str(json).expect("valid throw json");
        assert_eq!(t.kind, ThrowKind::NormalAltStd);
        assert_eq!(t.vertical_angle_deg, DEFAULT_VERTICAL_ANGLE_DEG);
    }

    #[test]
    fn sort_puts_highest_first() {
        let mut preds = vec![
            Prediction::new(0, 0, 0.2),
            Prediction::new(1, 0, 0.5),
            Prediction::new(2, 0, 0.3),
        ];
        sort_by_certainty(&mut preds);
        let order: Vec<i32> = preds.iter().map(|p| p.chunk_x).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert_eq!(top_prediction(&preds).map(|p| p.chunk_x), Some(1));
        assert_eq!(certainty_of(&preds, (2, 0)), Some(0.3));
        assert_eq!(certainty_of(&preds, (9, 9)), None);
    }

    #[test]
    fn duplicate_detection_compares_kind() {
        let a = EyeThrow::new(1.0, 2.0, 30.0, ThrowKind::Boat);
        let b = EyeThrow::new(1.0, 2.0, 30.0, ThrowKind::Normal);
        assert!(a.is_same_measurement(&a));
        assert!(!a.is_same_measurement(&b));
    }
}
