#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod resolver;
pub mod types;

// Stage modules – public for tools and tests, considered internals.
pub mod angle;
pub mod candidates;
pub mod conditioner;
pub mod correction;
pub mod density;
pub mod guidance;
pub mod posterior;
pub mod reweight;
pub mod rings;
pub mod sigma;
pub mod triangulate;

// --- High-level re-exports -------------------------------------------------

// Main entry points: resolver, session + results.
pub use crate::resolver::{
    NudgeDirection, NudgeOutcome, ResolverParams, StrongholdResolver, ThrowSession,
};
pub use crate::sigma::SigmaSettings;
pub use crate::types::{EyeThrow, Prediction, ResolveResult, ThrowKind};

// High-level diagnostics returned by the resolver.
pub use crate::diagnostics::{ResolveReport, ResolveTrace};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use stronghold_resolver::prelude::*;
///
/// # fn main() {
/// let resolver = StrongholdResolver::new(ResolverParams::default());
/// let mut session = ThrowSession::new();
/// session.push(EyeThrow::new(-120.0, 340.0, -31.4, ThrowKind::Normal));
/// session.push(EyeThrow::new(250.0, 610.0, -48.9, ThrowKind::Normal));
///
/// let report = session.resolve(&resolver);
/// println!("found={} latency_ms={:.3}", report.result.found, report.result.latency_ms);
/// # }
/// ```
pub mod prelude {
    pub use crate::{
        EyeThrow, Prediction, ResolveResult, ResolverParams, StrongholdResolver, ThrowKind,
        ThrowSession,
    };
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    // Stage runners.
    pub use crate::candidates::{generate_candidates, sweep_cone_chunks, CandidateOptions};
    pub use crate::conditioner::{
        apply_closest_stronghold_condition, ConditionerOptions, ConditionerStats,
    };
    pub use crate::guidance::{estimate_guidance, Guidance, GuidanceOptions, NextThrow};
    pub use crate::posterior::{posterior_from_prior, rank_and_truncate, PosteriorOptions};
    pub use crate::reweight::reweight_predictions;
    pub use crate::triangulate::{triangulate, Triangulation, TriangulationOptions};

    // Structured diagnostics types.
    pub use crate::diagnostics::{StageTiming, TimingBreakdown};
}
