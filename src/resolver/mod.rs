//! Stronghold resolver built from eye-of-ender bearings.
//!
//! Overview
//! - Sweeps the first throw's uncertainty cone for candidate chunks and
//!   weights them by the ring-model prior density.
//! - Applies every throw's Gaussian angular likelihood in order, with the
//!   variance inflated by the throw position's sub-block imprecision.
//! - Corrects the posterior for "the eye points at the closest stronghold",
//!   exactly for the leading candidates and by the mean factor for the tail.
//! - Ranks, truncates and renormalises; independently triangulates a
//!   least-squares chunk and derives guidance for the next throw.
//!
//! Modules
//! - [`params`] – configuration types used by the resolver and the CLI.
//! - `pipeline` – the stateless [`StrongholdResolver`] service.
//! - `session` – [`ThrowSession`], the throw list with reset, nudges and
//!   incremental reweighting between resolves.
//!
//! Key Ideas
//! - Angles follow the Minecraft yaw convention and are wrapped into
//!   `(-180, 180]` before every comparison.
//! - Ring and density tables are process-wide, built once and read-only.
//! - A nudge of an existing throw only changes that throw's likelihood term,
//!   so the session reweights the cached posterior in log space instead of
//!   recomputing it.

pub mod params;
mod pipeline;
mod session;

pub use params::ResolverParams;
pub use pipeline::StrongholdResolver;
pub use session::{NudgeDirection, NudgeOutcome, ThrowSession, MAX_ADJUSTMENT_DEG, UNDO_CAPACITY};
