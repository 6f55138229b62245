//! Offerings: one priced availability option of an instance type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::labels::{CAPACITY_TYPE_LABEL, CapacityType, ZONE_LABEL};
use crate::requirements::Requirements;

/// A (capacity type, zone, price) option for launching an instance type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    pub capacity_type: CapacityType,
    pub zone: String,
    /// Hourly price.
    pub price: f64,
    /// Whether capacity can currently be launched from this offering.
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Offering {
    pub fn new(capacity_type: CapacityType, zone: impl Into<String>, price: f64) -> Self {
        Self {
            capacity_type,
            zone: zone.into(),
            price,
            available: true,
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// The labels a node launched from this offering would carry.
    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (CAPACITY_TYPE_LABEL.to_string(), self.capacity_type.to_string()),
            (ZONE_LABEL.to_string(), self.zone.clone()),
        ])
    }

    pub fn is_compatible(&self, reqs: &Requirements) -> bool {
        reqs.compatible_with_labels(&self.labels())
    }
}

/// The offerings of one instance type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Offerings(Vec<Offering>);

impl Offerings {
    pub fn new(offerings: Vec<Offering>) -> Self {
        Self(offerings)
    }

    /// Offerings that can currently be launched.
    pub fn available(&self) -> Offerings {
        self.filtered(|o| o.available)
    }

    /// Offerings compatible with `reqs`.
    pub fn compatible(&self, reqs: &Requirements) -> Offerings {
        self.filtered(|o| o.is_compatible(reqs))
    }

    /// Offerings of the given capacity type.
    pub fn with_capacity_type(&self, capacity_type: CapacityType) -> Offerings {
        self.filtered(|o| o.capacity_type == capacity_type)
    }

    /// The offering for an exact capacity type and zone.
    pub fn get(&self, capacity_type: CapacityType, zone: &str) -> Option<&Offering> {
        self.0
            .iter()
            .find(|o| o.capacity_type == capacity_type && o.zone == zone)
    }

    pub fn most_expensive(&self) -> Option<&Offering> {
        self.0.iter().max_by(|a, b| a.price.total_cmp(&b.price))
    }

    pub fn cheapest(&self) -> Option<&Offering> {
        self.0.iter().min_by(|a, b| a.price.total_cmp(&b.price))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Offering> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn filtered(&self, keep: impl Fn(&Offering) -> bool) -> Offerings {
        Offerings(self.0.iter().filter(|o| keep(*o)).cloned().collect())
    }
}

impl FromIterator<Offering> for Offerings {
    fn from_iter<T: IntoIterator<Item = Offering>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
