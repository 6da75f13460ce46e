//! Core types for courier records and capacity lookups.

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Largest integer an `f64` represents exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Unique identifier for a courier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CourierId(pub u64);

impl fmt::Debug for CourierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CourierId({})", self.0)
    }
}

impl fmt::Display for CourierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A carrying capacity, used both as a courier attribute and as the
/// predicate key of a lookup.
///
/// Always finite and non-negative. Values that are numerically equal are
/// equal keys no matter how they were written: `40`, `40.0`, `"40"` and
/// `"40.0"` all produce the same `Capacity`.
#[derive(Clone, Copy)]
pub struct Capacity(f64);

impl Capacity {
    /// Zero capacity. Every courier satisfies it.
    pub const ZERO: Capacity = Capacity(0.0);

    /// Normalize a raw value into a capacity.
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(RegistryError::InvalidPredicateKey(format!(
                "{} is not a finite number",
                value
            )));
        }
        if value < 0.0 {
            return Err(RegistryError::InvalidPredicateKey(format!(
                "{} is negative",
                value
            )));
        }
        // -0.0 passes the check above; fold it into 0.0 so both hash alike.
        Ok(Capacity(if value == 0.0 { 0.0 } else { value }))
    }

    /// Parse a capacity out of a JSON value (a number or a numeric string).
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(v) => Self::new(v),
                None => Err(RegistryError::InvalidPredicateKey(format!(
                    "{} is not representable as a capacity",
                    n
                ))),
            },
            serde_json::Value::String(s) => s.parse(),
            other => Err(RegistryError::InvalidPredicateKey(format!(
                "expected a number, got {}",
                other
            ))),
        }
    }

    /// The raw numeric value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether a courier with this capacity can serve a lookup requiring
    /// `required`.
    pub fn satisfies(self, required: Capacity) -> bool {
        required <= self
    }

    fn as_integer(self) -> Option<u64> {
        if self.0.fract() == 0.0 && self.0 <= MAX_EXACT_INTEGER {
            Some(self.0 as u64)
        } else {
            None
        }
    }
}

impl PartialEq for Capacity {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Capacity {}

impl Hash for Capacity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for Capacity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Capacity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Debug for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capacity({})", self)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_integer() {
            Some(n) => write!(f, "{}", n),
            None => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for Capacity {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let value: f64 = trimmed.parse().map_err(|_| {
            RegistryError::InvalidPredicateKey(format!("{:?} is not a number", s))
        })?;
        Self::new(value)
    }
}

impl From<u32> for Capacity {
    fn from(value: u32) -> Self {
        Capacity(f64::from(value))
    }
}

impl TryFrom<u64> for Capacity {
    type Error = RegistryError;

    fn try_from(value: u64) -> Result<Self> {
        Self::new(value as f64)
    }
}

impl TryFrom<i64> for Capacity {
    type Error = RegistryError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value as f64)
    }
}

impl TryFrom<f64> for Capacity {
    type Error = RegistryError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl Serialize for Capacity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.as_integer() {
            Some(n) => serializer.serialize_u64(n),
            None => serializer.serialize_f64(self.0),
        }
    }
}

impl<'de> Deserialize<'de> for Capacity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Capacity::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// A courier record.
///
/// This is what the store persists and also the minimal reference a write
/// publishes to outstanding lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Courier {
    #[serde(alias = "_id")]
    pub id: CourierId,
    pub max_capacity: Capacity,
}

impl Courier {
    pub fn new(id: CourierId, max_capacity: Capacity) -> Self {
        Self { id, max_capacity }
    }

    /// Whether this courier can serve a lookup requiring `required`.
    pub fn can_carry(&self, required: Capacity) -> bool {
        self.max_capacity.satisfies(required)
    }
}
