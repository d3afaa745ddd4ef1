//! Lifecycle of the throw list between resolves.
//!
//! The session keeps every accepted throw. A reset hides the current throws
//! behind a prefix instead of dropping them, so only throws after the prefix
//! are "active". Manual angle nudges are stored per throw and applied on top
//! of the measured heading; while the active list itself is unchanged they
//! are folded into the cached posterior incrementally.

use super::pipeline::StrongholdResolver;
use crate::correction::AngleAdjustment;
use crate::diagnostics::{ResolveReport, ResolveTrace};
use crate::types::{EyeThrow, Prediction};
use log::debug;
use std::collections::VecDeque;
use std::time::Instant;

/// Largest accepted magnitude of a per-throw adjustment, in degrees.
pub const MAX_ADJUSTMENT_DEG: f64 = 5.0;
/// Undo entries kept before the oldest is dropped.
pub const UNDO_CAPACITY: usize = 256;
const ADJUSTMENT_EPS: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NudgeDirection {
    Increase,
    Decrease,
}

impl NudgeDirection {
    fn sign(self) -> f64 {
        match self {
            NudgeDirection::Increase => 1.0,
            NudgeDirection::Decrease => -1.0,
        }
    }
}

/// Outcome of a nudge, undo or redo request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NudgeOutcome {
    /// The last active throw now carries this adjustment (degrees).
    Applied(f64),
    /// The adjustment is already at the ±5° limit.
    LimitReached,
    /// No active throw, or nothing to undo/redo.
    Unavailable,
}

/// Posterior computed by the last full resolve.
#[derive(Clone, Debug)]
struct CachedPosterior {
    /// Active throws without adjustments.
    base: Vec<EyeThrow>,
    /// Throws the posterior was actually computed from.
    computed_from: Vec<EyeThrow>,
    predictions: Vec<Prediction>,
    trace: ResolveTrace,
}

#[derive(Clone, Debug, Default)]
pub struct ThrowSession {
    throws: Vec<EyeThrow>,
    ignored_prefix: usize,
    /// Per-throw adjustment in degrees, parallel to `throws`.
    adjustments: Vec<f64>,
    undo: VecDeque<f64>,
    redo: Vec<f64>,
    /// Active throw count the undo/redo history belongs to.
    history_active_count: usize,
    cache: Option<CachedPosterior>,
    /// Last selected target and whether it came from triangulation.
    last_target: Option<((i32, i32), bool)>,
}

impl ThrowSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a throw. Throws looking below the horizon and exact repeats of
    /// the last active throw are rejected.
    pub fn push(&mut self, throw: EyeThrow) -> bool {
        if throw.vertical_angle_deg > 0.0 {
            debug!("session: ignoring throw looking down ({:.2}°)", throw.vertical_angle_deg);
            return false;
        }
        if self
            .active_throws()
            .last()
            .is_some_and(|last| last.is_same_measurement(&throw))
        {
            debug!("session: ignoring duplicate throw at ({:.2}, {:.2})", throw.x, throw.z);
            return false;
        }
        self.throws.push(throw);
        self.adjustments.push(0.0);
        true
    }

    /// Hides every current throw and forgets adjustments, history, cached
    /// predictions and the selected target.
    pub fn reset(&mut self) {
        self.ignored_prefix = self.throws.len();
        self.adjustments.iter_mut().for_each(|a| *a = 0.0);
        self.clear_history();
        self.cache = None;
        self.last_target = None;
    }

    /// Drops every throw, including hidden ones.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Every accepted throw, hidden ones included.
    pub fn throws(&self) -> &[EyeThrow] {
        &self.throws
    }

    pub fn active_throws(&self) -> &[EyeThrow] {
        &self.throws[self.ignored_prefix.min(self.throws.len())..]
    }

    /// Active throws with their adjustments applied.
    pub fn adjusted_throws(&self) -> Vec<EyeThrow> {
        let start = self.ignored_prefix.min(self.throws.len());
        self.throws[start..]
            .iter()
            .zip(&self.adjustments[start..])
            .map(|(t, adj)| if *adj == 0.0 { *t } else { t.rotated(*adj) })
            .collect()
    }

    /// Adjustment of the last active throw, in degrees.
    pub fn last_adjustment(&self) -> Option<f64> {
        self.last_active_index().map(|i| self.adjustments[i])
    }

    /// Target chunk selected by the last conclusive resolve.
    pub fn target(&self) -> Option<(i32, i32)> {
        self.last_target.map(|(chunk, _)| chunk)
    }

    /// Moves the last active throw's heading by one adjustment step.
    pub fn nudge_last(
        &mut self,
        direction: NudgeDirection,
        adjustment: &AngleAdjustment,
    ) -> NudgeOutcome {
        self.sync_history();
        let Some(index) = self.last_active_index() else {
            return NudgeOutcome::Unavailable;
        };
        let current = self.adjustments[index];
        let step = adjustment.step_degrees(self.throws[index].vertical_angle_deg);
        let next =
            (current + direction.sign() * step).clamp(-MAX_ADJUSTMENT_DEG, MAX_ADJUSTMENT_DEG);
        if (next - current).abs() <= ADJUSTMENT_EPS {
            return NudgeOutcome::LimitReached;
        }
        if self.undo.len() == UNDO_CAPACITY {
            self.undo.pop_front();
        }
        self.undo.push_back(current);
        self.redo.clear();
        self.adjustments[index] = next;
        NudgeOutcome::Applied(next)
    }

    pub fn undo(&mut self) -> NudgeOutcome {
        self.sync_history();
        let Some(index) = self.last_active_index() else {
            return NudgeOutcome::Unavailable;
        };
        let Some(previous) = self.undo.pop_back() else {
            return NudgeOutcome::Unavailable;
        };
        self.redo.push(self.adjustments[index]);
        self.adjustments[index] = previous;
        NudgeOutcome::Applied(previous)
    }

    pub fn redo(&mut self) -> NudgeOutcome {
        self.sync_history();
        let Some(index) = self.last_active_index() else {
            return NudgeOutcome::Unavailable;
        };
        let Some(next) = self.redo.pop() else {
            return NudgeOutcome::Unavailable;
        };
        if self.undo.len() == UNDO_CAPACITY {
            self.undo.pop_front();
        }
        self.undo.push_back(self.adjustments[index]);
        self.adjustments[index] = next;
        NudgeOutcome::Applied(next)
    }

    /// Resolves the active throws.
    ///
    /// A full recompute runs whenever the active list changed since the last
    /// one. Otherwise the cached posterior is reused, reweighted for any
    /// adjustment made since it was computed. A low-confidence result keeps
    /// the previously selected target.
    pub fn resolve(&mut self, resolver: &StrongholdResolver) -> ResolveReport {
        let start = Instant::now();
        let base = self.active_throws().to_vec();
        let adjusted = self.adjusted_throws();

        let cached = self.cache.as_ref().filter(|c| c.base == base);
        let (predictions, trace) = match cached {
            Some(cache) if cache.computed_from == adjusted => {
                debug!("session: reusing cached posterior");
                (Some(cache.predictions.clone()), cache.trace.clone())
            }
            Some(cache) => {
                let mut trace = ResolveTrace {
                    incremental: true,
                    timings: Default::default(),
                    ..cache.trace.clone()
                };
                let predictions = trace.timings.time("reweight", || {
                    resolver.reweight(&cache.predictions, &cache.computed_from, &adjusted)
                });
                trace.posterior_count = predictions.as_ref().map_or(0, Vec::len);
                (predictions, trace)
            }
            None => {
                let mut trace = ResolveTrace {
                    throw_count: adjusted.len(),
                    ..ResolveTrace::default()
                };
                let predictions = resolver.posterior_with_trace(&adjusted, &mut trace);
                self.cache = predictions.as_ref().map(|p| CachedPosterior {
                    base: base.clone(),
                    computed_from: adjusted.clone(),
                    predictions: p.clone(),
                    trace: trace.clone(),
                });
                (predictions, trace)
            }
        };

        let mut report = resolver.finish(start, predictions, &adjusted, trace);
        let result = &mut report.result;
        if result.low_confidence {
            result.target = self.target();
            result.target_from_triangulation = self.last_target.is_some_and(|(_, native)| native);
        } else {
            self.last_target = result
                .target
                .map(|chunk| (chunk, result.target_from_triangulation));
        }
        report
    }

    fn last_active_index(&self) -> Option<usize> {
        (self.throws.len() > self.ignored_prefix).then(|| self.throws.len() - 1)
    }

    fn clear_history(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.history_active_count = self.active_throws().len();
    }

    fn sync_history(&mut self) {
        if self.history_active_count != self.active_throws().len() {
            self.clear_history();
        }
    }
}
