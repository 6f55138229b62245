//! Well-known label keys and capacity types.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Purchasing option of an offering (`spot` or `on-demand`).
pub const CAPACITY_TYPE_LABEL: &str = "karpenter.sh/capacity-type";

/// Availability zone of an offering or node.
pub const ZONE_LABEL: &str = "topology.kubernetes.io/zone";

/// Name of the instance type a node runs on.
pub const INSTANCE_TYPE_LABEL: &str = "node.kubernetes.io/instance-type";

/// Family of an instance type (e.g. `m5`, `c6g`).
pub const INSTANCE_FAMILY_LABEL: &str = "karpenter.k8s.aws/instance-family";

/// Capacity type of an offering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapacityType {
    Spot,
    OnDemand,
}

impl CapacityType {
    /// The label value as written on nodes and requirements.
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityType::Spot => "spot",
            CapacityType::OnDemand => "on-demand",
        }
    }
}

impl Display for CapacityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapacityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spot" => Ok(CapacityType::Spot),
            "on-demand" => Ok(CapacityType::OnDemand),
            other => Err(format!("unknown capacity type: {other}")),
        }
    }
}
