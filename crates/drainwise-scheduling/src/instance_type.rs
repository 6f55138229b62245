//! Instance types and min-values validation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SchedulingError, SchedulingResult};
use crate::labels::INSTANCE_TYPE_LABEL;
use crate::offering::Offerings;
use crate::requirements::Requirements;

/// A named compute shape and the offerings it can be launched from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceType {
    pub name: String,
    /// Labels every node of this type carries (family, arch, cpu, ...).
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub offerings: Offerings,
}

impl InstanceType {
    pub fn new(name: impl Into<String>, offerings: Offerings) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
            offerings,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Value of `key` on nodes of this type. The instance-type label falls
    /// back to the type's name.
    pub fn label(&self, key: &str) -> Option<&str> {
        match self.labels.get(key) {
            Some(v) => Some(v.as_str()),
            None if key == INSTANCE_TYPE_LABEL => Some(self.name.as_str()),
            None => None,
        }
    }

    /// Compatible when the type's labels satisfy `reqs` and at least one
    /// available offering does too.
    pub fn is_compatible(&self, reqs: &Requirements) -> bool {
        let mut labels = self.labels.clone();
        labels
            .entry(INSTANCE_TYPE_LABEL.to_string())
            .or_insert_with(|| self.name.clone());
        reqs.compatible_with_labels(&labels)
            && !self.offerings.available().compatible(reqs).is_empty()
    }
}

/// An ordered set of instance-type options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceTypes(Vec<InstanceType>);

impl InstanceTypes {
    pub fn new(instance_types: Vec<InstanceType>) -> Self {
        Self(instance_types)
    }

    /// Instance types compatible with `reqs`, order preserved.
    pub fn compatible(&self, reqs: &Requirements) -> InstanceTypes {
        self.0
            .iter()
            .filter(|it| it.is_compatible(reqs))
            .cloned()
            .collect()
    }

    /// Check every `minValues` requirement against this set.
    ///
    /// Walks the types in order and returns the shortest prefix whose
    /// distinct label values meet all of them, i.e. the types a replacement
    /// would need to keep. Without any `minValues` requirement the whole
    /// set is returned. Fails with the first unsatisfiable key.
    pub fn satisfies_min_values(&self, reqs: &Requirements) -> SchedulingResult<InstanceTypes> {
        if !reqs.has_min_values() {
            return Ok(self.clone());
        }

        let mut seen: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        if min_values_met(reqs, &seen) {
            return Ok(InstanceTypes::default());
        }

        for (idx, it) in self.0.iter().enumerate() {
            for req in reqs.min_values_requirements() {
                if let Some(value) = it.label(&req.key)
                    && req.has(value)
                {
                    seen.entry(req.key.as_str()).or_default().insert(value);
                }
            }
            if min_values_met(reqs, &seen) {
                debug!(needed = idx + 1, total = self.0.len(), "minValues satisfied");
                return Ok(InstanceTypes(self.0[..=idx].to_vec()));
            }
        }

        let unmet = reqs.min_values_requirements().find_map(|req| {
            let min_values = req.min_values.unwrap_or(0);
            let found = seen.get(req.key.as_str()).map_or(0, BTreeSet::len);
            (found < min_values).then(|| SchedulingError::MinValuesNotSatisfied {
                key: req.key.clone(),
                min_values,
                found,
            })
        });
        match unmet {
            Some(err) => Err(err),
            None => Ok(self.clone()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstanceType> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|it| it.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn min_values_met(reqs: &Requirements, seen: &BTreeMap<&str, BTreeSet<&str>>) -> bool {
    reqs.min_values_requirements().all(|req| {
        let found = seen.get(req.key.as_str()).map_or(0, BTreeSet::len);
        found >= req.min_values.unwrap_or(0)
    })
}

impl FromIterator<InstanceType> for InstanceTypes {
    fn from_iter<T: IntoIterator<Item = InstanceType>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a InstanceTypes {
    type Item = &'a InstanceType;
    type IntoIter = std::slice::Iter<'a, InstanceType>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{CAPACITY_TYPE_LABEL, CapacityType, INSTANCE_FAMILY_LABEL};
    use crate::offering::Offering;
    use crate::requirements::Requirement;

    fn make_type(name: &str, family: &str, price: f64) -> InstanceType {
        InstanceType::new(
            name,
            Offerings::new(vec![Offering::new(CapacityType::OnDemand, "us-east-1a", price)]),
        )
        .with_label(INSTANCE_FAMILY_LABEL, family)
    }

    fn family_min(n: usize) -> Requirements {
        Requirements::new([Requirement::exists(INSTANCE_FAMILY_LABEL).with_min_values(n)])
    }

    #[test]
    fn label_falls_back_to_name_for_instance_type_key() {
        let it = make_type("m5.large", "m5", 0.1);
        assert_eq!(it.label(INSTANCE_TYPE_LABEL), Some("m5.large"));
        assert_eq!(it.label(INSTANCE_FAMILY_LABEL), Some("m5"));
        assert_eq!(it.label("arch"), None);
    }

    #[test]
    fn compatible_requires_matching_labels_and_offering() {
        let types = InstanceTypes::new(vec![
            make_type("m5.large", "m5", 0.1),
            make_type("c5.large", "c5", 0.09),
        ]);

        let reqs = Requirements::new([Requirement::in_values(INSTANCE_FAMILY_LABEL, ["c5"])]);
        assert_eq!(types.compatible(&reqs).names(), vec!["c5.large"]);

        let spot_only = Requirements::new([Requirement::in_values(CAPACITY_TYPE_LABEL, ["spot"])]);
        assert!(types.compatible(&spot_only).is_empty());
    }

    #[test]
    fn unavailable_offerings_do_not_count_for_compatibility() {
        let it = InstanceType::new(
            "m5.large",
            Offerings::new(vec![
                Offering::new(CapacityType::OnDemand, "us-east-1a", 0.1).unavailable(),
            ]),
        );
        assert!(!it.is_compatible(&Requirements::default()));
    }

    #[test]
    fn min_values_returns_shortest_satisfying_prefix() {
        let types = InstanceTypes::new(vec![
            make_type("m5.large", "m5", 0.1),
            make_type("m5.xlarge", "m5", 0.2),
            make_type("c5.large", "c5", 0.09),
            make_type("r5.large", "r5", 0.13),
        ]);
        let needed = types.satisfies_min_values(&family_min(2)).unwrap();
        assert_eq!(needed.names(), vec!["m5.large", "m5.xlarge", "c5.large"]);
    }

    #[test]
    fn min_values_failure_names_the_key() {
        let types = InstanceTypes::new(vec![
            make_type("m5.large", "m5", 0.1),
            make_type("m5.xlarge", "m5", 0.2),
        ]);
        let err = types.satisfies_min_values(&family_min(2)).unwrap_err();
        assert_eq!(
            err,
            SchedulingError::MinValuesNotSatisfied {
                key: INSTANCE_FAMILY_LABEL.to_string(),
                min_values: 2,
                found: 1,
            }
        );
        assert!(err.to_string().contains(INSTANCE_FAMILY_LABEL));
    }

    #[test]
    fn min_values_only_counts_admitted_values() {
        let types = InstanceTypes::new(vec![
            make_type("m5.large", "m5", 0.1),
            make_type("c5.large", "c5", 0.09),
        ]);
        let reqs = Requirements::new([
            Requirement::in_values(INSTANCE_FAMILY_LABEL, ["m5", "r5"]).with_min_values(2),
        ]);
        assert!(types.satisfies_min_values(&reqs).is_err());
    }

    #[test]
    fn without_min_values_whole_set_is_returned() {
        let types = InstanceTypes::new(vec![make_type("m5.large", "m5", 0.1)]);
        let out = types.satisfies_min_values(&Requirements::default()).unwrap();
        assert_eq!(out, types);
    }

    #[test]
    fn empty_set_fails_positive_min_values() {
        let err = InstanceTypes::default()
            .satisfies_min_values(&family_min(1))
            .unwrap_err();
        assert!(matches!(err, SchedulingError::MinValuesNotSatisfied { found: 0, .. }));
    }
}
