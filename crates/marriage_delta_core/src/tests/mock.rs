//! Deterministic stand-ins for the calculation engine

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::categories::CategorySet;
use crate::engine::{CalculationEngine, EngineValue, MapTo, Simulation};
use crate::error::EngineError;
use crate::model::{HEAD, SPOUSE, ScenarioDocument, Year};

type Responder = dyn Fn(&ScenarioDocument, &str) -> Result<EngineValue, EngineError> + Send + Sync;

/// Engine answering every query with a closure over the loaded scenario
pub struct MockEngine {
    respond: Arc<Responder>,
    loads: AtomicUsize,
    calls: Arc<AtomicUsize>,
}

impl MockEngine {
    pub fn new(
        respond: impl Fn(&ScenarioDocument, &str) -> Result<EngineValue, EngineError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            respond: Arc::new(respond),
            loads: AtomicUsize::new(0),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Engine backed by `toy_model`
    pub fn toy() -> Self {
        Self::new(toy_engine_value)
    }

    /// Engine returning zero for every variable at every sample point
    pub fn zeros() -> Self {
        Self::new(|scenario, _| Ok(shaped(scenario, vec![0.0; scenario.sample_count()])))
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub struct MockSimulation {
    scenario: ScenarioDocument,
    respond: Arc<Responder>,
    calls: Arc<AtomicUsize>,
}

impl Simulation for MockSimulation {
    fn calculate(
        &mut self,
        variable: &str,
        year: Year,
        map_to: Option<MapTo>,
    ) -> Result<EngineValue, EngineError> {
        assert_eq!(year, self.scenario.year, "queried a different year");
        assert_eq!(map_to, Some(MapTo::Household));
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(&self.scenario, variable)
    }
}

impl CalculationEngine for MockEngine {
    type Simulation = MockSimulation;

    fn load(&self, scenario: &ScenarioDocument) -> Result<MockSimulation, EngineError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(MockSimulation {
            scenario: scenario.clone(),
            respond: self.respond.clone(),
            calls: self.calls.clone(),
        })
    }
}

/// Scalar for point scenarios, vector for sweeps
pub fn shaped(scenario: &ScenarioDocument, values: Vec<f64>) -> EngineValue {
    if scenario.is_sweep() {
        EngineValue::Vector(values)
    } else {
        EngineValue::Scalar(values[0])
    }
}

pub fn unavailable(variable: &str) -> EngineError {
    EngineError::Unavailable {
        variable: variable.to_string(),
        reason: "not modelled".to_string(),
    }
}

/// Adult incomes at every sample point, first axis varying slowest
pub fn sample_incomes(scenario: &ScenarioDocument) -> Vec<Vec<f64>> {
    let base: Vec<f64> = scenario
        .people
        .iter()
        .filter(|p| p.name == HEAD || p.name == SPOUSE)
        .map(|p| p.employment_income as f64)
        .collect();

    let mut samples = vec![base];
    for axis in &scenario.axes {
        let index = axis.index.unwrap_or(0);
        let values = axis.spec().values();
        samples = samples
            .into_iter()
            .flat_map(|sample| {
                values.iter().map(move |&v| {
                    let mut next = sample.clone();
                    next[index] = v as f64;
                    next
                })
            })
            .collect();
    }
    samples
}

pub fn child_count(scenario: &ScenarioDocument) -> usize {
    scenario
        .people
        .iter()
        .filter(|p| p.name != HEAD && p.name != SPOUSE)
        .count()
}

/// Small household model with a couple-sized tax bracket, a phased-out
/// earned credit and a means-tested benefit, enough to produce both
/// penalties and bonuses.
pub fn toy_model(incomes: &[f64], children: usize, variable: &str) -> Option<f64> {
    let earnings: f64 = incomes.iter().sum();
    let threshold = 40_000.0 * incomes.len() as f64;
    let income_tax = 0.1 * earnings.min(threshold) + 0.25 * (earnings - threshold).max(0.0);
    let payroll_tax = 0.0765 * earnings;
    let eitc = if children > 0 {
        (3_000.0 - 0.2 * (earnings - 20_000.0).max(0.0)).max(0.0)
    } else {
        (600.0 - 0.05 * earnings).max(0.0)
    };
    let ctc = 2_000.0 * children as f64;
    let snap = (4_000.0 + 1_000.0 * children as f64 - 0.2 * earnings).max(0.0);

    let taxes = income_tax + payroll_tax;
    let credits = eitc + ctc;
    Some(match variable {
        "household_net_income" => earnings + snap + credits - taxes,
        "household_benefits" => snap,
        "household_refundable_tax_credits" => credits,
        "household_tax_before_refundable_credits" => taxes,
        "snap" => snap,
        "eitc" => eitc,
        "refundable_ctc" => ctc,
        "income_tax_before_refundable_credits" => income_tax,
        "employee_payroll_tax" => payroll_tax,
        _ => return None,
    })
}

fn toy_engine_value(scenario: &ScenarioDocument, variable: &str) -> Result<EngineValue, EngineError> {
    let children = child_count(scenario);
    let values = sample_incomes(scenario)
        .iter()
        .map(|incomes| toy_model(incomes, children, variable).ok_or_else(|| unavailable(variable)))
        .collect::<Result<Vec<f64>, _>>()?;
    Ok(shaped(scenario, values))
}

/// Categories matching `toy_model`, with one unmodelled entry in each list
pub fn toy_categories() -> CategorySet {
    CategorySet {
        benefits: names(&["snap", "wic"]),
        refundable_credits: names(&["eitc", "refundable_ctc", "ca_eitc"]),
        taxes_before_refundable_credits: names(&[
            "employee_payroll_tax",
            "income_tax_before_refundable_credits",
            "flat_tax",
        ]),
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
