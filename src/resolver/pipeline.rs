//! Resolver pipeline orchestrating a full stronghold resolve.
//!
//! ```no_run
//! use stronghold_resolver::{EyeThrow, ResolverParams, StrongholdResolver, ThrowKind};
//!
//! let resolver = StrongholdResolver::new(ResolverParams::default());
//! let throws = [
//!     EyeThrow::new(-120.0, 340.0, -31.4, ThrowKind::Normal),
//!     EyeThrow::new(250.0, 610.0, -48.9, ThrowKind::Normal),
//! ];
//! let report = resolver.resolve(&throws);
//! if let Some(top) = report.result.top {
//!     println!("chunk ({}, {}) {:.1}%", top.chunk_x, top.chunk_z, top.certainty * 100.0);
//! }
//! ```

// Stages
// - Candidates: sweep the first throw's cone and weight chunks by the ring prior.
// - Posterior: apply every throw's likelihood in order, renormalising each time.
// - Conditioner: closest-stronghold correction against the first throw.
// - Ranking: sort, truncate, renormalise.
// - Triangulation: independent least-squares chunk from two or more throws.
// - Guidance: combined certainty, next-throw direction, mismeasure warning.

use super::params::ResolverParams;
use crate::candidates::generate_candidates;
use crate::conditioner::apply_closest_stronghold_condition;
use crate::diagnostics::{elapsed_ms, ResolveReport, ResolveTrace};
use crate::guidance::{estimate_guidance, Guidance};
use crate::posterior::{posterior_from_prior, rank_and_truncate};
use crate::reweight::reweight_predictions;
use crate::sigma::SigmaSettings;
use crate::triangulate::{triangulate, Triangulation};
use crate::types::{EyeThrow, Prediction, ResolveResult};
use log::debug;
use std::time::Instant;

/// Stateless resolver service. The ring and density tables it reads are
/// process-wide and built on first use.
#[derive(Clone, Debug, Default)]
pub struct StrongholdResolver {
    params: ResolverParams,
}

impl StrongholdResolver {
    /// Create a resolver with the supplied parameters.
    pub fn new(params: ResolverParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ResolverParams {
        &self.params
    }

    /// Update the per-kind measurement noise.
    pub fn set_sigmas(&mut self, sigmas: SigmaSettings) {
        self.params.sigmas = sigmas;
    }

    /// Sigmas after applying the accepted preference ranges.
    pub fn sigmas(&self) -> SigmaSettings {
        self.params.sigmas.clamped()
    }

    /// Run the full pipeline and capture per-stage diagnostics.
    pub fn resolve(&self, throws: &[EyeThrow]) -> ResolveReport {
        let start = Instant::now();
        let mut trace = ResolveTrace {
            throw_count: throws.len(),
            ..ResolveTrace::default()
        };
        let predictions = self.posterior_with_trace(throws, &mut trace);
        self.finish(start, predictions, throws, trace)
    }

    /// Ranked posterior only, without triangulation or guidance.
    pub fn predictions(&self, throws: &[EyeThrow]) -> Option<Vec<Prediction>> {
        let mut trace = ResolveTrace::default();
        self.posterior_with_trace(throws, &mut trace)
    }

    /// Weighted least-squares chunk from two or more throws.
    pub fn triangulate(&self, throws: &[EyeThrow]) -> Option<Triangulation> {
        triangulate(throws, &self.sigmas(), &self.params.triangulation)
    }

    /// Incremental update of `predictions` for angle nudges between `base`
    /// and `adjusted`.
    pub fn reweight(
        &self,
        predictions: &[Prediction],
        base: &[EyeThrow],
        adjusted: &[EyeThrow],
    ) -> Option<Vec<Prediction>> {
        reweight_predictions(predictions, base, adjusted, &self.sigmas())
    }

    /// Guidance for a ranked posterior and the active throws.
    pub fn guidance(&self, predictions: &[Prediction], throws: &[EyeThrow]) -> Guidance {
        estimate_guidance(
            predictions,
            throws,
            &self.sigmas(),
            &self.params.guidance,
            self.params.min_successful_certainty,
        )
    }

    pub(crate) fn posterior_with_trace(
        &self,
        throws: &[EyeThrow],
        trace: &mut ResolveTrace,
    ) -> Option<Vec<Prediction>> {
        let first = throws.first()?;
        let sigmas = self.sigmas();
        let timings = &mut trace.timings;

        let prior = timings.time("candidates", || {
            generate_candidates(throws, &sigmas, &self.params.candidates)
        })?;
        trace.candidate_count = prior.len();

        let mut predictions =
            timings.time("posterior", || posterior_from_prior(prior, throws, &sigmas))?;
        let stats = timings.time("conditioner", || {
            apply_closest_stronghold_condition(&mut predictions, first, &self.params.conditioner)
        })?;
        trace.conditioner = Some(stats);

        let ranked = timings.time("ranking", || {
            rank_and_truncate(&mut predictions, self.params.posterior.max_predictions)
        });
        if !ranked {
            return None;
        }
        trace.posterior_count = predictions.len();
        Some(predictions)
    }

    /// Triangulates, selects the target and attaches guidance.
    pub(crate) fn finish(
        &self,
        start: Instant,
        predictions: Option<Vec<Prediction>>,
        throws: &[EyeThrow],
        mut trace: ResolveTrace,
    ) -> ResolveReport {
        let triangulation = trace.timings.time("triangulation", || self.triangulate(throws));
        trace.triangulation = triangulation;

        let predictions = predictions.unwrap_or_default();
        let guidance = trace
            .timings
            .time("guidance", || self.guidance(&predictions, throws));
        let mut result = self.select_target(predictions, triangulation.map(|t| t.chunk()));
        result.guidance = guidance;

        let total = elapsed_ms(start);
        result.latency_ms = total;
        trace.timings.total_ms = total;
        debug!(
            "resolve: throws={} found={} target={:?} native={:?} total_ms={:.3}",
            trace.throw_count, result.found, result.target, result.native_chunk, total
        );
        ResolveReport { result, trace }
    }

    /// The top prediction is the target when it clears the success
    /// threshold; the triangulated chunk stands in only when the posterior
    /// produced nothing at all.
    fn select_target(
        &self,
        predictions: Vec<Prediction>,
        native: Option<(i32, i32)>,
    ) -> ResolveResult {
        let top = predictions.first().copied();
        let low_confidence = top.is_some_and(|p| {
            !p.certainty.is_finite() || p.certainty <= self.params.min_successful_certainty
        });
        let (target, target_from_triangulation) = match top {
            Some(p) if !low_confidence => (Some(p.chunk()), false),
            None if native.is_some() => (native, true),
            _ => (None, false),
        };
        ResolveResult {
            found: top.is_some(),
            predictions,
            top,
            low_confidence,
            native_chunk: native,
            target,
            target_from_triangulation,
            ..ResolveResult::default()
        }
    }
}
