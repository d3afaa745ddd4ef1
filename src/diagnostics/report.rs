use crate::conditioner::ConditionerStats;
use crate::diagnostics::TimingBreakdown;
use crate::triangulate::Triangulation;
use crate::types::ResolveResult;
use serde::Serialize;

/// Result produced by [`StrongholdResolver::resolve`](crate::StrongholdResolver).
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReport {
    pub result: ResolveResult,
    pub trace: ResolveTrace,
}

fn format_optional(val: Option<f64>) -> String {
    val.map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "-".to_string())
}

impl ResolveReport {
    /// One-line human readable summary.
    pub fn summary_line(&self) -> String {
        let r = &self.result;
        let top = r
            .top
            .map(|p| format!("({}, {}) {:.1}%", p.chunk_x, p.chunk_z, p.certainty * 100.0))
            .unwrap_or_else(|| "-".to_string());
        let native = r
            .native_chunk
            .map(|(x, z)| format!("({x}, {z})"))
            .unwrap_or_else(|| "-".to_string());
        format!(
            "found={} throws={} candidates={} top={} native={} combined={} latency_ms={:.3}",
            r.found,
            self.trace.throw_count,
            self.trace.candidate_count,
            top,
            native,
            format_optional(r.guidance.combined_certainty_percent),
            r.latency_ms
        )
    }
}

/// What each resolver stage did during one resolve.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveTrace {
    pub throw_count: usize,
    /// Chunks swept by the first-throw cone with a positive prior.
    pub candidate_count: usize,
    /// Predictions kept after ranking and truncation.
    pub posterior_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditioner: Option<ConditionerStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triangulation: Option<Triangulation>,
    /// True when the predictions came from the incremental reweighter.
    pub incremental: bool,
    pub timings: TimingBreakdown,
}
