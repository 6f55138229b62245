//! Snapshot types read by the scorer.
//!
//! These mirror the slices of node pool, node, and pod objects that
//! disruption scoring needs. They are assembled once per evaluation cycle
//! and never mutated here.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::DisruptionError;

// ── Node pool ─────────────────────────────────────────────────────

/// A group of nodes sharing a disruption policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePool {
    pub name: String,
    #[serde(default)]
    pub disruption: Disruption,
}

impl NodePool {
    pub fn new(name: impl Into<String>, expire_after: ExpireAfter) -> Self {
        Self {
            name: name.into(),
            disruption: Disruption { expire_after },
        }
    }
}

/// Disruption policy of a node pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disruption {
    #[serde(default)]
    pub expire_after: ExpireAfter,
}

/// Maximum node lifetime, or `Never`.
///
/// Parsed from Go-style duration strings such as `"720h"`, `"1h30m"`,
/// `"1.5s"` or `"250us"`, or `"Never"`. Units are `h`, `m`, `s`, `ms`,
/// `us` (or `µs`) and `ns`; fractions finer than a nanosecond are
/// truncated. A duration that comes out as zero is rejected, so a
/// configured lifetime is always strictly positive. Formatting uses the
/// largest unit that divides the duration exactly, so it parses back to
/// the same value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExpireAfter(Option<Duration>);

impl ExpireAfter {
    pub const NEVER: ExpireAfter = ExpireAfter(None);

    pub fn after(duration: Duration) -> Result<Self, DisruptionError> {
        if duration.is_zero() {
            return Err(DisruptionError::InvalidDuration {
                value: format!("{duration:?}"),
                reason: "must be positive".to_string(),
            });
        }
        Ok(Self(Some(duration)))
    }

    pub fn duration(&self) -> Option<Duration> {
        self.0
    }
}

impl FromStr for ExpireAfter {
    type Err = DisruptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("never") {
            return Ok(Self::NEVER);
        }
        let invalid = |reason: &str| DisruptionError::InvalidDuration {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        if s.is_empty() {
            return Err(invalid("empty duration"));
        }

        let mut total_nanos: u128 = 0;
        let mut rest = s;
        while !rest.is_empty() {
            let num_len = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .ok_or_else(|| invalid("missing unit"))?;
            let number = &rest[..num_len];
            rest = &rest[num_len..];

            let unit_len = rest
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(rest.len());
            let unit = unit_nanos(&rest[..unit_len])
                .ok_or_else(|| invalid("unknown unit, expected h, m, s, ms, us or ns"))?;
            rest = &rest[unit_len..];

            let nanos = scaled_nanos(number, unit).ok_or_else(|| invalid("malformed number"))?;
            total_nanos = total_nanos
                .checked_add(nanos)
                .ok_or_else(|| invalid("duration out of range"))?;
        }

        let secs = u64::try_from(total_nanos / NANOS_PER_SEC)
            .map_err(|_| invalid("duration out of range"))?;
        // Remainder of a division by 10^9 always fits.
        let subsec = (total_nanos % NANOS_PER_SEC) as u32;
        Self::after(Duration::new(secs, subsec)).map_err(|_| invalid("must be positive"))
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Units from largest to smallest, in nanoseconds.
const UNITS: [(&str, u128); 6] = [
    ("h", 3_600 * NANOS_PER_SEC),
    ("m", 60 * NANOS_PER_SEC),
    ("s", NANOS_PER_SEC),
    ("ms", 1_000_000),
    ("us", 1_000),
    ("ns", 1),
];

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        // micro sign and greek mu
        "\u{b5}s" | "\u{3bc}s" => Some(1_000),
        _ => UNITS.iter().find(|(name, _)| *name == unit).map(|(_, n)| *n),
    }
}

/// `number` (`"12"`, `"1.5"`, `".25"`) times `unit` nanoseconds. The
/// integer part is exact; the fraction is truncated to whole nanoseconds.
fn scaled_nanos(number: &str, unit: u128) -> Option<u128> {
    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole = if int_part.is_empty() {
        0
    } else {
        int_part.parse::<u128>().ok()?.checked_mul(unit)?
    };
    // Digits past the 18th are below a nanosecond for every unit.
    let digits = &frac_part[..frac_part.len().min(18)];
    let frac = if digits.is_empty() {
        0
    } else {
        digits.parse::<u128>().ok()? * unit / 10u128.pow(digits.len() as u32)
    };
    whole.checked_add(frac)
}

impl TryFrom<String> for ExpireAfter {
    type Error = DisruptionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExpireAfter> for String {
    fn from(value: ExpireAfter) -> Self {
        value.to_string()
    }
}

impl Display for ExpireAfter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Some(d) = self.0 else {
            return f.write_str("Never");
        };
        let nanos = d.as_nanos();
        let (unit, size) = UNITS
            .iter()
            .find(|(_, size)| nanos % size == 0)
            .copied()
            .unwrap_or(("ns", 1));
        write!(f, "{}{unit}", nanos / size)
    }
}

// ── Node ──────────────────────────────────────────────────────────

/// A running node being considered for disruption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub name: String,
    /// Name of the node pool that owns this node.
    pub node_pool: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Unix timestamp (seconds) when the node was created.
    pub created_at: u64,
}

impl Node {
    pub fn new(name: impl Into<String>, node_pool: impl Into<String>, created_at: u64) -> Self {
        Self {
            name: name.into(),
            node_pool: node_pool.into(),
            labels: BTreeMap::new(),
            created_at,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn creation_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.created_at)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

// ── Pod ───────────────────────────────────────────────────────────

/// A pod running on a disruption candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Scheduling priority resolved from the pod's priority class.
    #[serde(default)]
    pub priority: Option<i32>,
}

impl Pod {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// `namespace/name`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}
