//! Household description that the comparison scenarios are built from

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

/// Civil year a scenario is evaluated for
pub type Year = i16;

/// Age assigned to both adults
pub const DEFAULT_AGE: i32 = 40;

/// Two-letter state code, stored uppercase
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateCode(String);

impl StateCode {
    pub fn new(code: &str) -> Result<Self, ScenarioError> {
        let code = code.trim();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ScenarioError::InvalidStateCode(code.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StateCode {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for StateCode {
    type Error = ScenarioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<StateCode> for String {
    fn from(code: StateCode) -> Self {
        code.0
    }
}

/// Disability status for each member of the household
///
/// Children are keyed by the same number used in the children map; a child
/// without an entry is treated as not disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisabilityFlags {
    #[serde(default)]
    pub head: bool,
    #[serde(default)]
    pub spouse: bool,
    #[serde(default)]
    pub children: BTreeMap<u32, bool>,
}

impl DisabilityFlags {
    #[must_use]
    pub fn child(&self, number: u32) -> bool {
        self.children.get(&number).copied().unwrap_or(false)
    }

    /// Flags for the spouse filing alone, where the spouse becomes the head.
    #[must_use]
    pub fn spouse_as_head(&self) -> Self {
        Self {
            head: self.spouse,
            spouse: false,
            children: self.children.clone(),
        }
    }
}

/// A couple, their children and where they live
///
/// Children map a child number to an age in years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub state: StateCode,
    pub head_income: i64,
    pub spouse_income: i64,
    #[serde(default)]
    pub children: BTreeMap<u32, i32>,
    #[serde(default)]
    pub disability: DisabilityFlags,
    pub year: Year,
}

impl Household {
    pub fn new(state: StateCode, head_income: i64, spouse_income: i64, year: Year) -> Self {
        Self {
            state,
            head_income,
            spouse_income,
            children: BTreeMap::new(),
            disability: DisabilityFlags::default(),
            year,
        }
    }

    #[must_use]
    pub fn with_child(mut self, number: u32, age: i32) -> Self {
        self.children.insert(number, age);
        self
    }

    #[must_use]
    pub fn with_disability(mut self, disability: DisabilityFlags) -> Self {
        self.disability = disability;
        self
    }

    /// Same household with both adults' incomes replaced
    #[must_use]
    pub fn with_incomes(&self, head_income: i64, spouse_income: i64) -> Self {
        Self {
            head_income,
            spouse_income,
            ..self.clone()
        }
    }
}
