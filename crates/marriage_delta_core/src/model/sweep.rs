//! Income sweep axes

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

/// Variable every sweep axis varies
pub const SWEEP_VARIABLE: &str = "employment_income";

/// Most samples one axis may request; a married sweep evaluates its square
pub const MAX_SWEEP_COUNT: usize = 1024;

/// Sample count and income range shared by every axis of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSpec {
    pub count: usize,
    pub min: i64,
    pub max: i64,
}

impl Default for SweepSpec {
    fn default() -> Self {
        Self {
            count: 9,
            min: 0,
            max: 80_000,
        }
    }
}

impl SweepSpec {
    pub fn new(count: usize, min: i64, max: i64) -> Self {
        Self { count, min, max }
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.count == 0 {
            return Err(ScenarioError::InvalidSweep(
                "sample count must be at least 1".to_string(),
            ));
        }
        if self.count > MAX_SWEEP_COUNT {
            return Err(ScenarioError::InvalidSweep(format!(
                "sample count {} exceeds the maximum of {MAX_SWEEP_COUNT}",
                self.count
            )));
        }
        if self.min < 0 {
            return Err(ScenarioError::InvalidSweep(format!(
                "minimum income must not be negative (got {})",
                self.min
            )));
        }
        if self.max < self.min {
            return Err(ScenarioError::InvalidSweep(format!(
                "maximum {} is below minimum {}",
                self.max, self.min
            )));
        }
        Ok(())
    }

    /// Sample incomes along the axis, evenly spaced from `min` to `max`
    pub fn values(&self) -> Vec<i64> {
        if self.count <= 1 {
            return vec![self.min];
        }
        let span = (self.max - self.min) as f64;
        let steps = (self.count - 1) as f64;
        (0..self.count)
            .map(|i| self.min + (span * i as f64 / steps).round() as i64)
            .collect()
    }

    /// Axis for a one-adult scenario (no person index)
    pub fn axis(&self) -> SweepAxis {
        SweepAxis {
            name: SWEEP_VARIABLE.to_string(),
            count: self.count,
            min: self.min,
            max: self.max,
            index: None,
        }
    }

    /// Axis varying the adult at `index` (0 = head, 1 = spouse)
    pub fn axis_for(&self, index: usize) -> SweepAxis {
        SweepAxis {
            index: Some(index),
            ..self.axis()
        }
    }
}

/// One sweep dimension of a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepAxis {
    pub name: String,
    pub count: usize,
    pub min: i64,
    pub max: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl SweepAxis {
    pub fn spec(&self) -> SweepSpec {
        SweepSpec::new(self.count, self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values_step_by_ten_thousand() {
        let values = SweepSpec::default().values();
        assert_eq!(values, (0..=80_000).step_by(10_000).collect::<Vec<_>>());
    }

    #[test]
    fn test_single_sample_uses_min() {
        assert_eq!(SweepSpec::new(1, 500, 900).values(), vec![500]);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        assert!(SweepSpec::new(9, 10, 0).validate().is_err());
        assert!(SweepSpec::new(0, 0, 10).validate().is_err());
        assert!(SweepSpec::new(64, 0, 80_000).validate().is_ok());
    }

    #[test]
    fn test_validate_caps_sample_count() {
        assert!(SweepSpec::new(MAX_SWEEP_COUNT, 0, 80_000).validate().is_ok());
        assert!(matches!(
            SweepSpec::new(MAX_SWEEP_COUNT + 1, 0, 80_000).validate(),
            Err(ScenarioError::InvalidSweep(_))
        ));
        assert!(SweepSpec::new(1 << 33, 0, 80_000).validate().is_err());
    }
}
