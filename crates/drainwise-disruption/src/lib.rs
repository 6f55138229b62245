//! drainwise-disruption: disruption-cost and replacement-feasibility
//! scoring for node consolidation.
//!
//! Everything here is a pure function over snapshots handed in by the
//! consolidation controller. Nothing is cached or mutated, so
//! candidates can be scored from as many threads as the caller likes.
//!
//! # Components
//!
//! - **`lifetime`**: fraction of a node's lifetime remaining before expiry
//! - **`cost`**: per-pod eviction cost and the per-candidate sum
//! - **`pricing`**: worst-case launch price and filter-by-price
//! - **`candidate`**: ranking candidates and finding cheaper replacements
//! - **`clock`** / **`diagnostics`**: injected time source and warning sink
//!
//! # Cost model
//!
//! ```text
//! pod_cost  = clamp(1 + deletion_cost / 2^27 + priority / 2^25, -10, 10)
//! node_cost = sum(pod_cost) * lifetime_remaining
//! ```

pub mod candidate;
pub mod clock;
pub mod cost;
pub mod diagnostics;
pub mod error;
pub mod lifetime;
pub mod pricing;
pub mod types;

pub use candidate::{Candidate, RankOptions, RankedCandidate, rank_candidates};
pub use clock::{Clock, FakeClock, SystemClock};
pub use cost::{disruption_cost, pod_eviction_cost};
pub use diagnostics::{Diagnostic, DiagnosticSink, NoopSink, TracingSink};
pub use error::{DisruptionError, DisruptionResult};
pub use lifetime::lifetime_remaining;
pub use pricing::{LaunchPrice, filter_by_price, worst_launch_price};
pub use types::{Disruption, ExpireAfter, Node, NodePool, Pod};
