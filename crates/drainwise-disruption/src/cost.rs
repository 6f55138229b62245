//! Pod eviction cost and the per-candidate disruption cost.
//!
//! A pod costs 1.0 to evict by default. The deletion-cost annotation and
//! the scheduling priority shift that up or down:
//!
//! - deletion cost is in `[-2^31+1, 2^31-1]`; dividing by 2^27 makes the
//!   extremes worth about -15 and +17 default pods
//! - priority is in `[-2^31, 10^9]`; dividing by 2^25 keeps it on the
//!   same scale
//!
//! The per-pod result is clamped to `[-10.0, 10.0]`. The candidate total is
//! not clamped.

use tracing::trace;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::types::Pod;

/// Annotation carrying a user-assigned deletion cost.
pub const POD_DELETION_COST_ANNOTATION: &str = "controller.kubernetes.io/pod-deletion-cost";

/// Cost of evicting a pod with no annotation and no priority.
pub const BASE_POD_COST: f64 = 1.0;

/// Divisor applied to the deletion-cost annotation (2^27).
pub const DELETION_COST_DIVISOR: f64 = (1u64 << 27) as f64;

/// Divisor applied to the scheduling priority (2^25).
pub const PRIORITY_DIVISOR: f64 = (1u64 << 25) as f64;

pub const MIN_POD_COST: f64 = -10.0;
pub const MAX_POD_COST: f64 = 10.0;

/// Cost of evicting `pod`, in `[MIN_POD_COST, MAX_POD_COST]`.
///
/// A deletion-cost annotation that does not parse as a finite number is
/// reported to `sink` and otherwise ignored.
pub fn pod_eviction_cost(pod: &Pod, sink: &dyn DiagnosticSink) -> f64 {
    let mut cost = BASE_POD_COST;

    if let Some(raw) = pod.annotations.get(POD_DELETION_COST_ANNOTATION) {
        match parse_deletion_cost(raw) {
            Ok(deletion_cost) => cost += deletion_cost / DELETION_COST_DIVISOR,
            Err(reason) => sink.report(&Diagnostic::MalformedDeletionCost {
                pod: pod.key(),
                value: raw.clone(),
                reason,
            }),
        }
    }

    if let Some(priority) = pod.priority {
        cost += f64::from(priority) / PRIORITY_DIVISOR;
    }

    let cost = cost.clamp(MIN_POD_COST, MAX_POD_COST);
    trace!(pod = %pod.key(), cost, "pod eviction cost");
    cost
}

/// Sum of `pod_eviction_cost` over `pods`. Zero for no pods.
pub fn disruption_cost<'a, I>(pods: I, sink: &dyn DiagnosticSink) -> f64
where
    I: IntoIterator<Item = &'a Pod>,
{
    pods.into_iter().map(|p| pod_eviction_cost(p, sink)).sum()
}

fn parse_deletion_cost(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
    if !value.is_finite() {
        return Err("value is not finite".to_string());
    }
    Ok(value)
}
