//! Disruption candidates: ranking and replacement search.
//!
//! A candidate is a node with the pods running on it. The consolidation
//! controller ranks candidates cheapest-to-disrupt first, then for the one
//! it picks asks which instance types could replace it for less.

use drainwise_scheduling::labels::{CAPACITY_TYPE_LABEL, ZONE_LABEL};
use drainwise_scheduling::{CapacityType, InstanceType, InstanceTypes, Requirements};
use tracing::debug;

use crate::clock::Clock;
use crate::cost::disruption_cost;
use crate::diagnostics::DiagnosticSink;
use crate::error::{DisruptionError, DisruptionResult};
use crate::lifetime::lifetime_remaining;
use crate::pricing::{filter_by_price, worst_launch_price};
use crate::types::{Node, NodePool, Pod};

/// A node being evaluated for removal or replacement.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub node: Node,
    pub node_pool: NodePool,
    pub pods: Vec<Pod>,
    /// Instance type the node runs on, if known.
    pub instance_type: Option<InstanceType>,
}

/// Knobs for `rank_candidates`.
#[derive(Debug, Clone, Copy)]
pub struct RankOptions {
    /// Scale each candidate's cost by its remaining lifetime.
    pub apply_lifetime_decay: bool,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            apply_lifetime_decay: true,
        }
    }
}

/// A candidate with its computed cost.
#[derive(Debug, Clone)]
pub struct RankedCandidate<'a> {
    pub candidate: &'a Candidate,
    /// Sum of pod eviction costs, before lifetime decay.
    pub pod_cost: f64,
    pub lifetime_remaining: f64,
    /// The ranking key.
    pub disruption_cost: f64,
}

impl Candidate {
    pub fn new(node: Node, node_pool: NodePool, pods: Vec<Pod>) -> Self {
        Self {
            node,
            node_pool,
            pods,
            instance_type: None,
        }
    }

    pub fn with_instance_type(mut self, instance_type: InstanceType) -> Self {
        self.instance_type = Some(instance_type);
        self
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Cost of disrupting this candidate.
    pub fn disruption_cost<C: Clock + ?Sized>(
        &self,
        clock: &C,
        sink: &dyn DiagnosticSink,
        options: RankOptions,
    ) -> f64 {
        self.score(clock, sink, options).disruption_cost
    }

    /// Price of the offering this node was launched from, looked up by its
    /// capacity-type and zone labels. A node without those labels is priced
    /// at its instance type's worst-case launch price.
    pub fn current_price(&self) -> Option<f64> {
        let instance_type = self.instance_type.as_ref()?;
        let capacity_type = self
            .node
            .label(CAPACITY_TYPE_LABEL)
            .and_then(|ct| ct.parse::<CapacityType>().ok());

        match (capacity_type, self.node.label(ZONE_LABEL)) {
            (Some(capacity_type), Some(zone)) => instance_type
                .offerings
                .get(capacity_type, zone)
                .map(|o| o.price),
            _ => {
                debug!(node = %self.node.name, "no offering labels, using worst-case launch price");
                worst_launch_price(&instance_type.offerings.available(), &Requirements::default())
                    .known()
            }
        }
    }

    /// Replacement options strictly cheaper than this node's current price.
    pub fn cheaper_replacements(
        &self,
        options: &InstanceTypes,
        reqs: &Requirements,
    ) -> DisruptionResult<InstanceTypes> {
        let price = self
            .current_price()
            .ok_or_else(|| DisruptionError::UnknownPrice(self.node.name.clone()))?;
        filter_by_price(options, reqs, price)
    }

    fn score<C: Clock + ?Sized>(
        &self,
        clock: &C,
        sink: &dyn DiagnosticSink,
        options: RankOptions,
    ) -> RankedCandidate<'_> {
        let pod_cost = disruption_cost(&self.pods, sink);
        let lifetime = if options.apply_lifetime_decay {
            lifetime_remaining(clock, &self.node_pool, &self.node)
        } else {
            1.0
        };
        RankedCandidate {
            candidate: self,
            pod_cost,
            lifetime_remaining: lifetime,
            disruption_cost: pod_cost * lifetime,
        }
    }
}

/// Score `candidates` and sort them cheapest-to-disrupt first. Equal costs
/// are ordered by node name.
pub fn rank_candidates<'a, C: Clock + ?Sized>(
    candidates: &'a [Candidate],
    clock: &C,
    sink: &dyn DiagnosticSink,
    options: RankOptions,
) -> Vec<RankedCandidate<'a>> {
    let mut ranked: Vec<RankedCandidate<'a>> = candidates
        .iter()
        .map(|c| c.score(clock, sink, options))
        .collect();

    ranked.sort_by(|a, b| {
        a.disruption_cost
            .total_cmp(&b.disruption_cost)
            .then_with(|| a.candidate.name().cmp(b.candidate.name()))
    });

    debug!(candidates = ranked.len(), "ranked disruption candidates");
    ranked
}
