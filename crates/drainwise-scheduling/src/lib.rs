//! drainwise-scheduling: the query surface shared with the scheduling
//! simulator.
//!
//! The simulator produces `Requirements` and `InstanceType` options for a
//! replacement; the disruption scorer only reads them. This crate owns
//! those types and their queries:
//!
//! - **`requirements`**: label-key constraints (`In`, `NotIn`, `Exists`,
//!   `DoesNotExist`, `Gt`, `Lt`) with optional `minValues`
//! - **`offering`**: priced, capacity-type-tagged availability options
//! - **`instance_type`**: compute shapes and min-values validation
//! - **`labels`**: well-known label keys and capacity types

pub mod error;
pub mod instance_type;
pub mod labels;
pub mod offering;
pub mod requirements;

pub use error::{SchedulingError, SchedulingResult};
pub use instance_type::{InstanceType, InstanceTypes};
pub use labels::CapacityType;
pub use offering::{Offering, Offerings};
pub use requirements::{Operator, Requirement, Requirements};
