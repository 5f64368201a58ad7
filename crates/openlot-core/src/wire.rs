//! Value conventions shared with the remote service.
//!
//! - Integers are arbitrary precision and travel as decimal strings.
//! - Optional values travel as a zero-or-one-element sequence.
//! - Unit variants sent to the service travel as `{ "Name": null }`.

use serde::de::{self, Deserializer, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Arbitrary-precision non-negative integer.
///
/// Used for ids, prices, bid amounts, counts and timestamps. The digits are
/// kept in canonical decimal form, so equality and ordering are exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nat {
    digits: String,
}

impl Nat {
    /// Zero.
    pub fn zero() -> Self {
        Self {
            digits: "0".to_string(),
        }
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.digits == "0"
    }

    /// The canonical decimal digits.
    pub fn as_str(&self) -> &str {
        &self.digits
    }
}

impl Default for Nat {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Nat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

impl Ord for Nat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.digits
            .len()
            .cmp(&other.digits.len())
            .then_with(|| self.digits.cmp(&other.digits))
    }
}

impl PartialOrd for Nat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Nat {
    type Err = NatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NatError::Invalid(s.to_string()));
        }
        let trimmed = s.trim_start_matches('0');
        if trimmed.is_empty() {
            return Ok(Self::zero());
        }
        Ok(Self {
            digits: trimmed.to_string(),
        })
    }
}

macro_rules! nat_from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Nat {
            fn from(n: $t) -> Self {
                Self { digits: n.to_string() }
            }
        }
    )*};
}

nat_from_unsigned!(u8, u16, u32, u64, u128, usize);

macro_rules! nat_try_from_signed {
    ($($t:ty),*) => {$(
        impl TryFrom<$t> for Nat {
            type Error = NatError;

            fn try_from(n: $t) -> Result<Self, Self::Error> {
                if n < 0 {
                    return Err(NatError::Negative(n.to_string()));
                }
                Ok(Self { digits: n.to_string() })
            }
        }
    )*};
}

nat_try_from_signed!(i32, i64, i128);

macro_rules! nat_try_into_unsigned {
    ($($t:ty),*) => {$(
        impl TryFrom<&Nat> for $t {
            type Error = NatError;

            fn try_from(n: &Nat) -> Result<Self, Self::Error> {
                n.digits
                    .parse::<$t>()
                    .map_err(|_| NatError::Overflow {
                        value: n.digits.clone(),
                        target: stringify!($t),
                    })
            }
        }
    )*};
}

nat_try_into_unsigned!(u32, u64, u128);

/// Error converting to or from a [`Nat`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NatError {
    #[error("negative value cannot be a natural number: {0}")]
    Negative(String),
    #[error("{value} does not fit in {target}")]
    Overflow { value: String, target: &'static str },
    #[error("not a decimal natural number: {0:?}")]
    Invalid(String),
}

impl Serialize for Nat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.digits)
    }
}

impl<'de> Deserialize<'de> for Nat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NatVisitor)
    }
}

struct NatVisitor;

impl Visitor<'_> for NatVisitor {
    type Value = Nat;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or a non-negative integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Nat, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Nat, E> {
        Ok(Nat::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Nat, E> {
        Ok(Nat::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Nat, E> {
        Nat::try_from(v).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Nat, E> {
        Err(E::invalid_type(de::Unexpected::Float(v), &self))
    }
}

/// An optional value in its sequence encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opt<T>(pub Option<T>);

impl<T> From<Option<T>> for Opt<T> {
    fn from(value: Option<T>) -> Self {
        Self(value)
    }
}

impl<T> From<Opt<T>> for Option<T> {
    fn from(value: Opt<T>) -> Self {
        value.0
    }
}

impl<T: Serialize> Serialize for Opt<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0
            .as_ref()
            .map_or(&[][..], std::slice::from_ref)
            .serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Opt<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        if items.len() > 1 {
            return Err(de::Error::invalid_length(
                items.len(),
                &"zero or one element",
            ));
        }
        Ok(Self(items.into_iter().next()))
    }
}

/// Field adapter: `#[serde(with = "openlot_core::wire::opt")]` on an `Option<T>`.
pub mod opt {
    use super::Opt;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        value
            .as_ref()
            .map_or(&[][..], std::slice::from_ref)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Opt::<T>::deserialize(deserializer).map(Option::from)
    }
}

/// Serialize a payload-free variant as a single-key record.
pub fn serialize_unit_variant<S: Serializer>(
    name: &str,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(name, &())?;
    map.end()
}
