//! Parameter types configuring the resolver stages.
//!
//! Every stage owns its own options struct; `ResolverParams` groups them so a
//! single JSON document can configure the whole pipeline. All structs fall
//! back to their defaults for missing fields.

use crate::candidates::CandidateOptions;
use crate::conditioner::ConditionerOptions;
use crate::correction::AngleAdjustment;
use crate::guidance::GuidanceOptions;
use crate::posterior::PosteriorOptions;
use crate::sigma::SigmaSettings;
use crate::triangulate::TriangulationOptions;
use serde::Deserialize;

/// Resolver-wide parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResolverParams {
    /// Measurement noise per throw kind (degrees).
    pub sigmas: SigmaSettings,
    pub candidates: CandidateOptions,
    pub conditioner: ConditionerOptions,
    pub posterior: PosteriorOptions,
    pub triangulation: TriangulationOptions,
    pub guidance: GuidanceOptions,
    /// Step used when nudging the last throw by hand.
    pub angle_adjustment: AngleAdjustment,
    /// Top certainty at or below which a resolve counts as inconclusive.
    pub min_successful_certainty: f64,
}

impl Default for ResolverParams {
    fn default() -> Self {
        Self {
            sigmas: SigmaSettings::default(),
            candidates: CandidateOptions::default(),
            conditioner: ConditionerOptions::default(),
            posterior: PosteriorOptions::default(),
            triangulation: TriangulationOptions::default(),
            guidance: GuidanceOptions::default(),
            angle_adjustment: AngleAdjustment::default(),
            min_successful_certainty: 0.0005,
        }
    }
}
