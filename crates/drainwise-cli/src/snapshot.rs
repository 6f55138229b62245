//! Cluster snapshot files.
//!
//! A snapshot is what the consolidation controller would hand the scorer
//! in one evaluation cycle, written out as JSON so it can be replayed.

use std::path::Path;

use anyhow::{Context, bail};
use drainwise_disruption::{Candidate, Node, NodePool, Pod};
use drainwise_scheduling::{InstanceTypes, Requirements};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub node_pools: Vec<NodePool>,
    /// Requirements a replacement must satisfy.
    #[serde(default)]
    pub requirements: Requirements,
    /// Replacement options, in the simulator's preference order.
    #[serde(default)]
    pub instance_types: InstanceTypes,
    pub candidates: Vec<CandidateSpec>,
}

/// A candidate as written in the snapshot; node pool and instance type
/// are referenced by name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSpec {
    pub node: Node,
    #[serde(default)]
    pub pods: Vec<Pod>,
    #[serde(default)]
    pub instance_type: Option<String>,
}

impl Snapshot {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parsing snapshot {}", path.display()))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(content)?;
        debug!(
            node_pools = snapshot.node_pools.len(),
            candidates = snapshot.candidates.len(),
            instance_types = snapshot.instance_types.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Resolve every candidate's node pool and instance type.
    pub fn candidates(&self) -> anyhow::Result<Vec<Candidate>> {
        self.candidates.iter().map(|spec| self.resolve(spec)).collect()
    }

    fn resolve(&self, spec: &CandidateSpec) -> anyhow::Result<Candidate> {
        let Some(node_pool) = self
            .node_pools
            .iter()
            .find(|p| p.name == spec.node.node_pool)
        else {
            bail!(
                "node {} references unknown node pool {}",
                spec.node.name,
                spec.node.node_pool
            );
        };

        let mut candidate = Candidate::new(spec.node.clone(), node_pool.clone(), spec.pods.clone());
        if let Some(name) = &spec.instance_type {
            let Some(it) = self.instance_types.iter().find(|it| &it.name == name) else {
                bail!("node {} references unknown instance type {name}", spec.node.name);
            };
            candidate = candidate.with_instance_type(it.clone());
        }
        Ok(candidate)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const FIXTURE: &str = include_str!("../tests/fixtures/snapshot.json");

    #[test]
    fn fixture_resolves_candidates() {
        let snapshot = Snapshot::from_json(FIXTURE).unwrap();
        let candidates = snapshot.candidates().unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].node_pool.name, "general");
        assert_eq!(candidates[1].pods.len(), 2);
        assert_eq!(
            candidates[0].instance_type.as_ref().map(|it| it.name.as_str()),
            Some("m5.large")
        );
    }

    #[test]
    fn unknown_node_pool_is_an_error() {
        let json = r#"{
            "candidates": [{"node": {"name": "n1", "nodePool": "missing", "createdAt": 0}}]
        }"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        let err = snapshot.candidates().unwrap_err();
        assert!(err.to_string().contains("unknown node pool missing"));
    }

    #[test]
    fn unknown_instance_type_is_an_error() {
        let json = r#"{
            "nodePools": [{"name": "default"}],
            "candidates": [{"node": {"name": "n1", "nodePool": "default", "createdAt": 0}, "instanceType": "x9.huge"}]
        }"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        let err = snapshot.candidates().unwrap_err();
        assert!(err.to_string().contains("x9.huge"));
    }

    #[test]
    fn zero_expire_after_is_rejected_at_load() {
        let json = r#"{
            "nodePools": [{"name": "default", "disruption": {"expireAfter": "0s"}}],
            "candidates": []
        }"#;
        assert!(Snapshot::from_json(json).is_err());
    }
}
