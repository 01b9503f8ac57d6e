//! Program Evaluator
//!
//! Loads a scenario into the calculation engine once and extracts the four
//! household aggregates plus the benefit, credit and tax breakdowns.

use tracing::debug;

use crate::categories::{CategoryProvider, CategorySet};
use crate::engine::{CalculationEngine, MapTo, Simulation};
use crate::error::{EngineError, EvaluationError, GridError, Result};
use crate::model::{
    Category, CategoryBreakdown, HouseholdMetric, ProgramResult, ProgramSeries, ScenarioDocument,
    Year,
};

/// Engine values are truncated to whole currency units.
fn to_currency(variable: &str, value: f64) -> std::result::Result<i64, EngineError> {
    if !value.is_finite() {
        return Err(EngineError::Failed(format!(
            "{variable} is not a finite amount ({value})"
        )));
    }
    Ok(value.trunc() as i64)
}

/// Evaluates scenarios against an engine and a category provider
pub struct Evaluator<'a, E: ?Sized, P: ?Sized> {
    engine: &'a E,
    categories: &'a P,
}

impl<E: ?Sized, P: ?Sized> Clone for Evaluator<'_, E, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: ?Sized, P: ?Sized> Copy for Evaluator<'_, E, P> {}

impl<'a, E, P> Evaluator<'a, E, P>
where
    E: CalculationEngine + ?Sized,
    P: CategoryProvider + ?Sized,
{
    pub fn new(engine: &'a E, categories: &'a P) -> Self {
        Self { engine, categories }
    }

    /// Evaluate a point scenario.
    ///
    /// A breakdown variable the engine reports unavailable contributes zero;
    /// any failure on one of the four aggregates is returned.
    pub fn evaluate(&self, scenario: &ScenarioDocument) -> Result<ProgramResult> {
        scenario.validate()?;
        let mut simulation = self.engine.load(scenario)?;
        let year = scenario.year;

        let mut totals = [0i64; 4];
        for (total, metric) in totals.iter_mut().zip(HouseholdMetric::ALL) {
            *total = scalar(&mut simulation, metric.variable(), year)?;
        }
        let [net_income, benefits, refundable_credits, tax_before_refundable_credits] = totals;

        let set = self.categories.categories(&scenario.state, year);
        let benefit_programs = breakdown(&mut simulation, &set, Category::Benefits, year)?;
        let credits = breakdown(&mut simulation, &set, Category::RefundableCredits, year)?;
        let taxes = breakdown(
            &mut simulation,
            &set,
            Category::TaxesBeforeRefundableCredits,
            year,
        )?;

        Ok(ProgramResult {
            net_income,
            benefits,
            refundable_credits,
            tax_before_refundable_credits,
            taxes,
            benefit_programs,
            credits,
        })
    }

    /// Evaluate a sweep scenario, one engine call per requested metric.
    ///
    /// Each vector holds one value per sample point in the engine's order;
    /// its length is checked against the scenario's sample count.
    pub fn evaluate_series(
        &self,
        scenario: &ScenarioDocument,
        metrics: &[HouseholdMetric],
    ) -> Result<ProgramSeries> {
        scenario.validate()?;
        let mut simulation = self.engine.load(scenario)?;
        let expected = scenario.sample_count();

        let mut series = ProgramSeries::default();
        for &metric in metrics {
            let values = simulation
                .calculate(metric.variable(), scenario.year, Some(MapTo::Household))?
                .into_vec();
            if values.len() != expected {
                return Err(GridError::ShapeMismatch {
                    variable: metric.variable().to_string(),
                    expected,
                    actual: values.len(),
                }
                .into());
            }
            if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
                return Err(EngineError::Failed(format!(
                    "{} is not a finite amount ({bad})",
                    metric.variable()
                ))
                .into());
            }
            series.metrics.push((metric, values));
        }
        Ok(series)
    }
}

fn scalar<S: Simulation>(simulation: &mut S, variable: &str, year: Year) -> Result<i64> {
    let value = simulation.calculate(variable, year, Some(MapTo::Household))?;
    debug!(variable, ?value, "calculated");
    let Some(amount) = value.as_scalar() else {
        return Err(GridError::ShapeMismatch {
            variable: variable.to_string(),
            expected: 1,
            actual: value.len(),
        }
        .into());
    };
    Ok(to_currency(variable, amount)?)
}

fn breakdown<S: Simulation>(
    simulation: &mut S,
    set: &CategorySet,
    category: Category,
    year: Year,
) -> Result<CategoryBreakdown> {
    let mut breakdown = CategoryBreakdown::new();
    for variable in set.variables(category) {
        let amount = match scalar(simulation, variable, year) {
            Ok(amount) => amount,
            Err(EvaluationError::EngineUnavailable(EngineError::Unavailable {
                reason,
                ..
            })) => {
                debug!(variable, %reason, category = category.label(), "counting as zero");
                0
            }
            Err(e) => return Err(e),
        };
        breakdown.insert(variable.clone(), amount);
    }
    Ok(breakdown)
}
