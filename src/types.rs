//! Core data types for the signal relay
//!
//! This module contains the small closed domain moved through the relay.
//!
//! # Main Types
//!
//! - [`ParameterName`] - The closed set of signal names (`Signal 1`..`Signal 3`)
//! - [`ParameterValue`] - An integer in `[0, 100)`
//! - [`Update`] - One `(name, value)` fact produced by the producer
//!
//! Values are validated on construction, so an [`Update`] that exists is
//! always inside the domain.

use crate::error::{RelayError, Result};
use rand::distr::{Distribution, StandardUniform};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of a relayed parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParameterName {
    #[serde(rename = "Signal 1")]
    Signal1,
    #[serde(rename = "Signal 2")]
    Signal2,
    #[serde(rename = "Signal 3")]
    Signal3,
}

impl ParameterName {
    /// Every parameter name, in display order
    pub const ALL: [ParameterName; 3] = [
        ParameterName::Signal1,
        ParameterName::Signal2,
        ParameterName::Signal3,
    ];

    /// The wire string for this name
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterName::Signal1 => "Signal 1",
            ParameterName::Signal2 => "Signal 2",
            ParameterName::Signal3 => "Signal 3",
        }
    }

    /// Position of this name in [`ParameterName::ALL`]
    pub fn index(&self) -> usize {
        match self {
            ParameterName::Signal1 => 0,
            ParameterName::Signal2 => 1,
            ParameterName::Signal3 => 2,
        }
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterName {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        ParameterName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| RelayError::UnknownParameter(s.to_string()))
    }
}

impl Distribution<ParameterName> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ParameterName {
        ParameterName::ALL[rng.random_range(0..ParameterName::ALL.len())]
    }
}

/// Value of a relayed parameter, always in `[0, 100)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ParameterValue(u8);

impl ParameterValue {
    /// Exclusive upper bound of the value range
    pub const MAX_EXCLUSIVE: u8 = 100;

    /// Create a value, rejecting anything outside `[0, 100)`
    pub fn new(value: i64) -> Result<Self> {
        if (0..i64::from(Self::MAX_EXCLUSIVE)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(RelayError::MalformedMessage(format!(
                "value {} is outside [0, {})",
                value,
                Self::MAX_EXCLUSIVE
            )))
        }
    }

    /// The raw integer
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for ParameterValue {
    type Error = RelayError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ParameterValue> for i64 {
    fn from(value: ParameterValue) -> Self {
        i64::from(value.0)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Distribution<ParameterValue> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ParameterValue {
        ParameterValue(rng.random_range(0..ParameterValue::MAX_EXCLUSIVE))
    }
}

/// A single parameter update moving through the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Update {
    pub name: ParameterName,
    pub value: ParameterValue,
}

impl Update {
    pub fn new(name: ParameterName, value: ParameterValue) -> Self {
        Self { name, value }
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
