//! Short text renderings of predictions for overlays and logs.

use crate::angle::{chunk_center_blocks, heading_deg, normalize_degrees};
use crate::types::Prediction;
use serde::Deserialize;
use std::fmt::Write;

/// Player position (overworld blocks) and facing used for relative labels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPose {
    pub x: f64,
    pub z: f64,
    pub yaw_deg: f64,
}

/// `#1 x,z p% | #2 ...` for the first `max_count` predictions. Overworld
/// coordinates are the chunk corner, nether ones the chunk times two.
pub fn format_prediction_summary(sorted: &[Prediction], max_count: usize, nether: bool) -> String {
    if sorted.is_empty() || max_count == 0 {
        return "-".to_string();
    }
    let scale = if nether { 2 } else { 16 };
    let mut out = String::new();
    for (i, p) in sorted.iter().take(max_count).enumerate() {
        if i > 0 {
            out.push_str(" | ");
        }
        let _ = write!(
            out,
            "#{} {},{} {:.1}%",
            i + 1,
            p.chunk_x * scale,
            p.chunk_z * scale,
            p.certainty * 100.0
        );
    }
    out
}

/// One candidate row: overworld aim point and certainty, optionally followed
/// by distance, nether coordinates and the signed turn from `pose.yaw_deg`.
pub fn format_candidate_row(rank: usize, prediction: &Prediction, pose: &PlayerPose, detailed: bool) -> String {
    let ow_x = chunk_center_blocks(prediction.chunk_x);
    let ow_z = chunk_center_blocks(prediction.chunk_z);
    let mut row = format!(
        "#{} ({}, {}) {:.1}%",
        rank,
        ow_x.round() as i64,
        ow_z.round() as i64,
        (prediction.certainty * 100.0).clamp(0.0, 100.0)
    );
    if detailed {
        let dx = ow_x - pose.x;
        let dz = ow_z - pose.z;
        let distance = (dx * dx + dz * dz).sqrt();
        let yaw_delta = if dx == 0.0 && dz == 0.0 {
            0.0
        } else {
            normalize_degrees(heading_deg(dx, dz) - pose.yaw_deg)
        };
        let _ = write!(
            row,
            " {:.0} ({}, {}) {:+.2}",
            distance,
            prediction.chunk_x * 2,
            prediction.chunk_z * 2,
            yaw_delta
        );
    }
    row
}

/// 1-based rank of `chunk` in `predictions`, or 0 when absent.
pub fn prediction_rank(predictions: &[Prediction], chunk: (i32, i32)) -> usize {
    predictions
        .iter()
        .position(|p| p.chunk() == chunk)
        .map_or(0, |i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preds() -> Vec<Prediction> {
        vec![Prediction::new(10, -20, 0.55), Prediction::new(11, -20, 0.3)]
    }

    #[test]
    fn summary_lists_ranked_predictions() {
        assert_eq!(
            format_prediction_summary(&preds(), 5, false),
            "#1 160,-320 55.0% | #2 176,-320 30.0%"
        );
        assert_eq!(format_prediction_summary(&preds(), 1, true), "#1 20,-40 55.0%");
        assert_eq!(format_prediction_summary(&[], 3, false), "-");
    }

    #[test]
    fn candidate_row_reports_relative_turn() {
        let pose = PlayerPose {
            x: 168.0,
            z: 0.0,
            yaw_deg: 170.0,
        };
        let p = Prediction::new(10, -20, 0.554);
        assert_eq!(format_candidate_row(1, &p, &pose, false), "#1 (168, -312) 55.4%");
        assert_eq!(
            format_candidate_row(1, &p, &pose, true),
            "#1 (168, -312) 55.4% 312 (20, -40) +10.00"
        );
    }

    #[test]
    fn rank_is_one_based() {
        assert_eq!(prediction_rank(&preds(), (11, -20)), 2);
        assert_eq!(prediction_rank(&preds(), (0, 0)), 0);
    }
}
