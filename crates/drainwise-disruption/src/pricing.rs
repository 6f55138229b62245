//! Launch prices and price-based narrowing of replacement options.
//!
//! A replacement is only worth launching if it is strictly cheaper than the
//! node it replaces. Since the scheduler may pick any compatible offering,
//! prices are compared pessimistically: the most expensive compatible
//! offering stands for the whole instance type.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use drainwise_scheduling::labels::CAPACITY_TYPE_LABEL;
use drainwise_scheduling::{CapacityType, InstanceTypes, Offerings, Requirements};
use tracing::debug;

use crate::error::{DisruptionError, DisruptionResult};

/// Worst-case launch price of an instance type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LaunchPrice {
    /// Price of the most expensive usable offering.
    Known(f64),
    /// No offering is usable under the requirements. Sorts above every
    /// known price and is never cheaper than anything.
    NoUsableOffering,
}

impl LaunchPrice {
    pub fn known(&self) -> Option<f64> {
        match self {
            LaunchPrice::Known(price) => Some(*price),
            LaunchPrice::NoUsableOffering => None,
        }
    }

    /// Strict comparison against a reference price. Ties are not cheaper.
    pub fn is_cheaper_than(&self, reference: f64) -> bool {
        matches!(self, LaunchPrice::Known(price) if *price < reference)
    }

    /// Numeric form, with `f64::MAX` standing in for `NoUsableOffering`.
    pub fn as_f64(&self) -> f64 {
        self.known().unwrap_or(f64::MAX)
    }
}

impl PartialOrd for LaunchPrice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (LaunchPrice::Known(a), LaunchPrice::Known(b)) => a.partial_cmp(b),
            (LaunchPrice::Known(_), LaunchPrice::NoUsableOffering) => Some(Ordering::Less),
            (LaunchPrice::NoUsableOffering, LaunchPrice::Known(_)) => Some(Ordering::Greater),
            (LaunchPrice::NoUsableOffering, LaunchPrice::NoUsableOffering) => Some(Ordering::Equal),
        }
    }
}

impl Display for LaunchPrice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchPrice::Known(price) => write!(f, "{price:.4}"),
            LaunchPrice::NoUsableOffering => f.write_str("no usable offering"),
        }
    }
}

/// Worst-case launch price among `offerings` under `reqs`.
///
/// Spot is preferred: if the requirements allow spot and any compatible
/// spot offering exists, the most expensive of those is the answer and
/// on-demand is not looked at. Otherwise, if on-demand is allowed, the most
/// expensive compatible on-demand offering is used.
pub fn worst_launch_price(offerings: &Offerings, reqs: &Requirements) -> LaunchPrice {
    let allowed = reqs.get(CAPACITY_TYPE_LABEL);
    let compatible = offerings.compatible(reqs);

    for capacity_type in [CapacityType::Spot, CapacityType::OnDemand] {
        if !allowed.has(capacity_type.as_str()) {
            continue;
        }
        if let Some(offering) = compatible.with_capacity_type(capacity_type).most_expensive() {
            return LaunchPrice::Known(offering.price);
        }
    }
    LaunchPrice::NoUsableOffering
}

/// Instance types whose worst-case launch price is strictly below `price`.
///
/// Only available offerings are considered. When `reqs` carry a
/// `minValues` constraint, the narrowed set is validated again, since
/// dropping expensive types can remove the diversity the scheduling
/// simulation relied on. A failed validation fails the whole call.
pub fn filter_by_price(
    options: &InstanceTypes,
    reqs: &Requirements,
    price: f64,
) -> DisruptionResult<InstanceTypes> {
    let cheaper: InstanceTypes = options
        .iter()
        .filter(|it| worst_launch_price(&it.offerings.available(), reqs).is_cheaper_than(price))
        .cloned()
        .collect();

    debug!(
        reference_price = price,
        options = options.len(),
        cheaper = cheaper.len(),
        "filtered instance types by price"
    );

    if reqs.has_min_values() {
        cheaper
            .satisfies_min_values(reqs)
            .map_err(DisruptionError::MinValues)?;
    }
    Ok(cheaper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drainwise_scheduling::labels::{INSTANCE_FAMILY_LABEL, ZONE_LABEL};
    use drainwise_scheduling::{InstanceType, Offering, Requirement, SchedulingError};

    fn spot(price: f64) -> Offering {
        Offering::new(CapacityType::Spot, "us-east-1a", price)
    }

    fn on_demand(price: f64) -> Offering {
        Offering::new(CapacityType::OnDemand, "us-east-1a", price)
    }

    fn capacity(values: &[&str]) -> Requirements {
        Requirements::new([Requirement::in_values(CAPACITY_TYPE_LABEL, values.iter().copied())])
    }

    fn make_type(name: &str, family: &str, price: f64) -> InstanceType {
        InstanceType::new(name, Offerings::new(vec![on_demand(price)]))
            .with_label(INSTANCE_FAMILY_LABEL, family)
    }

    #[test]
    fn spot_is_preferred_over_on_demand() {
        let ofs = Offerings::new(vec![spot(0.4), spot(0.9), on_demand(1.5)]);
        let price = worst_launch_price(&ofs, &capacity(&["spot", "on-demand"]));
        assert_eq!(price, LaunchPrice::Known(0.9));
    }

    #[test]
    fn unconstrained_capacity_type_prefers_spot() {
        let ofs = Offerings::new(vec![on_demand(1.5), spot(0.3)]);
        assert_eq!(worst_launch_price(&ofs, &Requirements::default()), LaunchPrice::Known(0.3));
    }

    #[test]
    fn falls_back_to_on_demand_without_spot_offerings() {
        let ofs = Offerings::new(vec![on_demand(1.1), on_demand(1.5)]);
        let price = worst_launch_price(&ofs, &capacity(&["spot", "on-demand"]));
        assert_eq!(price, LaunchPrice::Known(1.5));
    }

    #[test]
    fn on_demand_only_requirements_ignore_spot() {
        let ofs = Offerings::new(vec![spot(0.4), on_demand(1.5)]);
        let price = worst_launch_price(&ofs, &capacity(&["on-demand"]));
        assert_eq!(price, LaunchPrice::Known(1.5));
    }

    #[test]
    fn incompatible_zone_is_excluded() {
        let ofs = Offerings::new(vec![
            spot(0.4),
            Offering::new(CapacityType::Spot, "us-east-1b", 2.0),
        ]);
        let reqs = capacity(&["spot"]).with(Requirement::in_values(ZONE_LABEL, ["us-east-1a"]));
        assert_eq!(worst_launch_price(&ofs, &reqs), LaunchPrice::Known(0.4));
    }

    #[test]
    fn no_compatible_offering_is_unbounded() {
        let ofs = Offerings::new(vec![spot(0.4)]);
        let price = worst_launch_price(&ofs, &capacity(&["on-demand"]));
        assert_eq!(price, LaunchPrice::NoUsableOffering);
        assert_eq!(price.as_f64(), f64::MAX);
        assert!(!price.is_cheaper_than(f64::MAX));
        assert_eq!(worst_launch_price(&Offerings::default(), &Requirements::default()), LaunchPrice::NoUsableOffering);
    }

    #[test]
    fn sentinel_sorts_above_known_prices() {
        assert!(LaunchPrice::NoUsableOffering > LaunchPrice::Known(f64::MAX));
        assert!(LaunchPrice::Known(0.1) < LaunchPrice::Known(0.2));
    }

    #[test]
    fn filter_keeps_strictly_cheaper_types() {
        let options = InstanceTypes::new(vec![
            make_type("a", "m5", 0.5),
            make_type("b", "c5", 0.9),
            make_type("c", "r5", 1.0),
            make_type("d", "t3", 1.2),
        ]);
        let kept = filter_by_price(&options, &Requirements::default(), 1.0).unwrap();
        assert_eq!(kept.names(), vec!["a", "b"]);
    }

    #[test]
    fn filter_ignores_unavailable_offerings() {
        let options = InstanceTypes::new(vec![InstanceType::new(
            "a",
            Offerings::new(vec![on_demand(0.2).unavailable()]),
        )]);
        let kept = filter_by_price(&options, &Requirements::default(), 1.0).unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn filter_may_return_empty_without_min_values() {
        let options = InstanceTypes::new(vec![make_type("a", "m5", 2.0)]);
        let kept = filter_by_price(&options, &Requirements::default(), 1.0).unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn filter_revalidates_min_values() {
        let options = InstanceTypes::new(vec![
            make_type("m5.large", "m5", 0.5),
            make_type("m5.xlarge", "m5", 0.8),
            make_type("c5.large", "c5", 1.4),
        ]);
        let reqs = Requirements::new([Requirement::exists(INSTANCE_FAMILY_LABEL).with_min_values(2)]);

        let err = filter_by_price(&options, &reqs, 1.0).unwrap_err();
        assert_eq!(
            err,
            DisruptionError::MinValues(SchedulingError::MinValuesNotSatisfied {
                key: INSTANCE_FAMILY_LABEL.to_string(),
                min_values: 2,
                found: 1,
            })
        );
        assert!(err.to_string().starts_with("validating minValues, "));
        assert!(err.to_string().contains(INSTANCE_FAMILY_LABEL));

        let kept = filter_by_price(&options, &reqs, 2.0).unwrap();
        assert_eq!(kept.len(), 3);
    }
}
