//! Label-key constraints attached to a replacement decision.
//!
//! A `Requirements` set maps each label key to one `Requirement`. Keys that
//! are absent are unconstrained: `get` hands back an `Exists` requirement
//! for them, so callers can ask `reqs.get(key).has(value)` without first
//! checking whether the key was ever mentioned.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{SchedulingError, SchedulingResult};

/// Selection operator of a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
    /// Integer label value strictly greater than the single bound.
    Gt,
    /// Integer label value strictly less than the single bound.
    Lt,
}

/// A constraint on the values one label key may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub key: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub values: BTreeSet<String>,
    /// Minimum number of distinct values the candidate instance types must
    /// cover for this key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_values: Option<usize>,
}

impl Requirement {
    /// Build and validate a requirement.
    pub fn new<I, S>(key: impl Into<String>, operator: Operator, values: I) -> SchedulingResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = Self {
            key: key.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
            min_values: None,
        };
        req.validate()?;
        Ok(req)
    }

    /// `key In (values...)`. Always valid.
    pub fn in_values<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            operator: Operator::In,
            values: values.into_iter().map(Into::into).collect(),
            min_values: None,
        }
    }

    /// `key Exists`: any value is allowed.
    pub fn exists(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator: Operator::Exists,
            values: BTreeSet::new(),
            min_values: None,
        }
    }

    pub fn with_min_values(mut self, min_values: usize) -> Self {
        self.min_values = Some(min_values);
        self
    }

    /// Check operator/value consistency.
    pub fn validate(&self) -> SchedulingResult<()> {
        let invalid = |reason: &str| SchedulingError::InvalidRequirement {
            key: self.key.clone(),
            reason: reason.to_string(),
        };
        match self.operator {
            Operator::Exists | Operator::DoesNotExist if !self.values.is_empty() => {
                Err(invalid("Exists and DoesNotExist take no values"))
            }
            Operator::Gt | Operator::Lt => match self.integer_bound() {
                Some(_) => Ok(()),
                None => Err(invalid("Gt and Lt take exactly one integer value")),
            },
            _ => Ok(()),
        }
    }

    /// Whether `value` satisfies this requirement.
    pub fn has(&self, value: &str) -> bool {
        match self.operator {
            Operator::In => self.values.contains(value),
            Operator::NotIn => !self.values.contains(value),
            Operator::Exists => true,
            Operator::DoesNotExist => false,
            Operator::Gt => self.compare_bound(value, |v, bound| v > bound),
            Operator::Lt => self.compare_bound(value, |v, bound| v < bound),
        }
    }

    fn integer_bound(&self) -> Option<i64> {
        if self.values.len() != 1 {
            return None;
        }
        self.values.iter().next()?.parse().ok()
    }

    fn compare_bound(&self, value: &str, cmp: impl Fn(i64, i64) -> bool) -> bool {
        match (value.parse::<i64>(), self.integer_bound()) {
            (Ok(v), Some(bound)) => cmp(v, bound),
            _ => false,
        }
    }
}

/// An immutable set of requirements keyed by label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Requirement>", into = "Vec<Requirement>")]
pub struct Requirements {
    inner: BTreeMap<String, Requirement>,
}

impl Requirements {
    /// Build from a list of requirements. A later requirement for the same
    /// key replaces an earlier one.
    pub fn new(requirements: impl IntoIterator<Item = Requirement>) -> Self {
        requirements.into_iter().collect()
    }

    /// Return a copy with `requirement` added (replacing any for its key).
    pub fn with(&self, requirement: Requirement) -> Self {
        let mut inner = self.inner.clone();
        inner.insert(requirement.key.clone(), requirement);
        Self { inner }
    }

    /// The requirement for `key`, or `Exists` if the key is unconstrained.
    pub fn get(&self, key: &str) -> Cow<'_, Requirement> {
        match self.inner.get(key) {
            Some(req) => Cow::Borrowed(req),
            None => Cow::Owned(Requirement::exists(key)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Whether any requirement carries a `minValues` constraint.
    pub fn has_min_values(&self) -> bool {
        self.inner.values().any(|r| r.min_values.is_some())
    }

    /// Requirements with a `minValues` constraint, in key order.
    pub fn min_values_requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.inner.values().filter(|r| r.min_values.is_some())
    }

    /// Whether a set of concrete labels is compatible with these
    /// requirements. Only keys the label set defines are checked; a label
    /// set that says nothing about a key does not conflict with it.
    pub fn compatible_with_labels(&self, labels: &BTreeMap<String, String>) -> bool {
        labels.iter().all(|(key, value)| match self.inner.get(key) {
            Some(req) => req.has(value),
            None => true,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.inner.values()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl FromIterator<Requirement> for Requirements {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        Self {
            inner: iter.into_iter().map(|r| (r.key.clone(), r)).collect(),
        }
    }
}

impl TryFrom<Vec<Requirement>> for Requirements {
    type Error = SchedulingError;

    fn try_from(value: Vec<Requirement>) -> Result<Self, Self::Error> {
        for req in &value {
            req.validate()?;
        }
        Ok(value.into_iter().collect())
    }
}

impl From<Requirements> for Vec<Requirement> {
    fn from(value: Requirements) -> Self {
        value.inner.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{CAPACITY_TYPE_LABEL, ZONE_LABEL};

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn absent_key_behaves_as_exists() {
        let reqs = Requirements::default();
        let req = reqs.get(CAPACITY_TYPE_LABEL);
        assert_eq!(req.operator, Operator::Exists);
        assert!(req.has("spot"));
        assert!(req.has("on-demand"));
    }

    #[test]
    fn in_and_not_in() {
        let r = Requirement::in_values(ZONE_LABEL, ["us-east-1a", "us-east-1b"]);
        assert!(r.has("us-east-1a"));
        assert!(!r.has("us-east-1c"));

        let r = Requirement::new(ZONE_LABEL, Operator::NotIn, ["us-east-1a"]).unwrap();
        assert!(!r.has("us-east-1a"));
        assert!(r.has("us-east-1c"));
    }

    #[test]
    fn does_not_exist_admits_nothing() {
        let r = Requirement::new("gpu", Operator::DoesNotExist, Vec::<String>::new()).unwrap();
        assert!(!r.has("true"));
    }

    #[test]
    fn gt_and_lt_compare_integers() {
        let gt = Requirement::new("cpu", Operator::Gt, ["4"]).unwrap();
        assert!(gt.has("8"));
        assert!(!gt.has("4"));
        assert!(!gt.has("many"));

        let lt = Requirement::new("cpu", Operator::Lt, ["4"]).unwrap();
        assert!(lt.has("2"));
        assert!(!lt.has("4"));
    }

    #[test]
    fn gt_with_non_integer_bound_is_rejected() {
        let err = Requirement::new("cpu", Operator::Gt, ["lots"]).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidRequirement { ref key, .. } if key == "cpu"));
    }

    #[test]
    fn exists_with_values_is_rejected() {
        assert!(Requirement::new("gpu", Operator::Exists, ["true"]).is_err());
    }

    #[test]
    fn has_min_values_detects_any_key() {
        let reqs = Requirements::new([Requirement::in_values(CAPACITY_TYPE_LABEL, ["spot"])]);
        assert!(!reqs.has_min_values());

        let reqs = reqs.with(Requirement::exists("family").with_min_values(2));
        assert!(reqs.has_min_values());
        assert_eq!(reqs.min_values_requirements().count(), 1);
    }

    #[test]
    fn labels_compatibility_checks_only_defined_keys() {
        let reqs = Requirements::new([
            Requirement::in_values(CAPACITY_TYPE_LABEL, ["spot"]),
            Requirement::in_values(ZONE_LABEL, ["us-east-1a"]),
        ]);

        assert!(reqs.compatible_with_labels(&labels(&[(CAPACITY_TYPE_LABEL, "spot")])));
        assert!(reqs.compatible_with_labels(&labels(&[
            (CAPACITY_TYPE_LABEL, "spot"),
            (ZONE_LABEL, "us-east-1a"),
            ("arch", "arm64"),
        ])));
        assert!(!reqs.compatible_with_labels(&labels(&[(CAPACITY_TYPE_LABEL, "on-demand")])));
    }

    #[test]
    fn later_requirement_replaces_earlier() {
        let reqs = Requirements::new([
            Requirement::in_values(ZONE_LABEL, ["a"]),
            Requirement::in_values(ZONE_LABEL, ["b"]),
        ]);
        assert_eq!(reqs.len(), 1);
        assert!(reqs.get(ZONE_LABEL).has("b"));
    }

    #[test]
    fn deserializes_from_selector_list() {
        let json = r#"[
            {"key": "karpenter.sh/capacity-type", "operator": "In", "values": ["spot", "on-demand"]},
            {"key": "family", "operator": "Exists", "minValues": 2}
        ]"#;
        let reqs: Requirements = serde_json::from_str(json).unwrap();
        assert!(reqs.get(CAPACITY_TYPE_LABEL).has("spot"));
        assert_eq!(reqs.get("family").min_values, Some(2));
    }

    #[test]
    fn deserialization_validates_operators() {
        let json = r#"[{"key": "cpu", "operator": "Lt", "values": ["1", "2"]}]"#;
        assert!(serde_json::from_str::<Requirements>(json).is_err());
    }
}
