//! Lifetime decay: how much of a node's lifetime is left.
//!
//! A node that is about to expire will be replaced anyway, so disrupting it
//! early costs little. Multiplying a candidate's disruption cost by the
//! remaining fraction makes ageing nodes cheaper to disrupt: just after
//! creation the fraction is 1.0 and it approaches 0.0 at expiry.

use std::time::Duration;

use crate::clock::Clock;
use crate::types::{Node, NodePool};

/// Fraction of `node`'s lifetime remaining, in `[0.0, 1.0]`.
///
/// Returns 1.0 when the node pool has no `expireAfter`.
///
/// Precondition: a configured `expireAfter` is strictly positive.
/// `ExpireAfter` enforces this when parsed; a zero lifetime would divide
/// by zero.
pub fn lifetime_remaining<C: Clock + ?Sized>(clock: &C, node_pool: &NodePool, node: &Node) -> f64 {
    match node_pool.disruption.expire_after.duration() {
        Some(total) => remaining_fraction(clock.since(node.creation_time()), total),
        None => 1.0,
    }
}

/// `(total - age) / total`, clamped to `[0.0, 1.0]`. `total` must be
/// non-zero.
pub fn remaining_fraction(age: Duration, total: Duration) -> f64 {
    let total_secs = total.as_secs_f64();
    let remaining_secs = total_secs - age.as_secs_f64();
    (remaining_secs / total_secs).clamp(0.0, 1.0)
}
