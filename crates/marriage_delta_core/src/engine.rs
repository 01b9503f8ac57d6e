//! Calculation engine boundary
//!
//! The tax-and-benefit engine is opaque. An engine `load`s a scenario once,
//! which may be expensive, and the resulting `Simulation` answers individual
//! variable queries for it. A scenario with sweep axes answers with a vector,
//! one value per sample point.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::{ScenarioDocument, Year};

/// Value returned for a variable query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EngineValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl EngineValue {
    pub fn len(&self) -> usize {
        match self {
            EngineValue::Scalar(_) => 1,
            EngineValue::Vector(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Single value of a point evaluation, if there is exactly one
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            EngineValue::Scalar(value) => Some(*value),
            EngineValue::Vector(values) if values.len() == 1 => Some(values[0]),
            EngineValue::Vector(_) => None,
        }
    }

    pub fn into_vec(self) -> Vec<f64> {
        match self {
            EngineValue::Scalar(value) => vec![value],
            EngineValue::Vector(values) => values,
        }
    }
}

/// Entity level a variable is mapped to before it is returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapTo {
    Person,
    Household,
}

impl MapTo {
    pub fn as_str(self) -> &'static str {
        match self {
            MapTo::Person => "person",
            MapTo::Household => "household",
        }
    }
}

/// A scenario loaded into the engine
pub trait Simulation {
    fn calculate(
        &mut self,
        variable: &str,
        year: Year,
        map_to: Option<MapTo>,
    ) -> Result<EngineValue, EngineError>;
}

pub trait CalculationEngine {
    type Simulation: Simulation;

    fn load(&self, scenario: &ScenarioDocument) -> Result<Self::Simulation, EngineError>;
}

impl<E: CalculationEngine + ?Sized> CalculationEngine for &E {
    type Simulation = E::Simulation;

    fn load(&self, scenario: &ScenarioDocument) -> Result<Self::Simulation, EngineError> {
        (**self).load(scenario)
    }
}
