//! Diagnostics data model returned by the resolver and used by the tools.
//!
//! `ResolveReport` is the main entry point, bundling the `ResolveResult` with
//! a `ResolveTrace` describing what every stage did and how long it took.

pub mod labels;
pub mod report;
pub mod timing;

pub use labels::{format_candidate_row, format_prediction_summary, prediction_rank, PlayerPose};
pub use report::{ResolveReport, ResolveTrace};
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
