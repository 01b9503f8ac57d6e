//! Grid Reshaper
//!
//! Builds the head-income × spouse-income delta grid. Three sweep scenarios are
//! evaluated: married with one axis per adult, head alone with one axis and the
//! children, spouse alone with one axis and no children. The separate baseline
//! is the outer sum of the two single-filer vectors:
//!
//! ```text
//! separate[i][j] = head[i] + spouse[j]
//! delta[i][j]    = married[i][j] - separate[i][j]
//! ```
//!
//! Rows index head income samples and columns index spouse income samples.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::categories::CategoryProvider;
use crate::engine::CalculationEngine;
use crate::error::{GridError, Result};
use crate::evaluate::Evaluator;
use crate::model::{Household, HouseholdMetric, ProgramSeries, SweepSpec};

/// Dense 2-D grid stored row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeGrid {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl IncomeGrid {
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            data: vec![value; rows * cols],
            rows,
            cols,
        }
    }

    /// Wrap row-major data; `None` if the length is not `rows * cols`.
    pub fn from_data(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != rows * cols {
            return None;
        }
        Some(Self { data, rows, cols })
    }

    /// Reshape an engine vector, reporting a mismatch against `variable`.
    pub fn reshape(
        variable: &str,
        rows: usize,
        cols: usize,
        data: Vec<f64>,
    ) -> std::result::Result<Self, GridError> {
        let actual = data.len();
        Self::from_data(rows, cols, data).ok_or_else(|| GridError::ShapeMismatch {
            variable: variable.to_string(),
            expected: rows * cols,
            actual,
        })
    }

    /// `grid[i][j] = rows[i] + cols[j]`
    pub fn outer_sum(rows: &[f64], cols: &[f64]) -> Self {
        let data = rows
            .iter()
            .flat_map(|r| cols.iter().map(move |c| r + c))
            .collect();
        Self {
            data,
            rows: rows.len(),
            cols: cols.len(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.data[row * self.cols + col])
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.rows {
            return None;
        }
        Some(&self.data[row * self.cols..(row + 1) * self.cols])
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Iterate over `(row, col, value)` in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.data
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i / self.cols, i % self.cols, v))
    }

    /// Element-wise `self - other`; `None` when shapes differ.
    pub fn difference(&self, other: &Self) -> Option<Self> {
        if self.rows != other.rows || self.cols != other.cols {
            return None;
        }
        let data = self.data.iter().zip(&other.data).map(|(a, b)| a - b).collect();
        Some(Self {
            data,
            rows: self.rows,
            cols: self.cols,
        })
    }

    #[must_use]
    pub fn negated(&self) -> Self {
        Self {
            data: self.data.iter().map(|v| -v).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|&v| v == 0.0)
    }

    /// Largest absolute value in the grid
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |acc, v| acc.max(v.abs()))
    }
}

/// Delta grid for one metric, with the pieces it was built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaGrid {
    pub metric: HouseholdMetric,
    /// Income at each sample, shared by both axes
    pub axis: Vec<i64>,
    pub married: IncomeGrid,
    pub head: Vec<f64>,
    pub spouse: Vec<f64>,
    pub separate: IncomeGrid,
    pub delta: IncomeGrid,
}

impl DeltaGrid {
    /// Delta oriented so a larger value is better for the household.
    ///
    /// Tax before refundable credits is negated; the fiscal meaning of the
    /// stored `delta` is unchanged.
    pub fn display_values(&self) -> IncomeGrid {
        if self.metric.higher_is_better() {
            self.delta.clone()
        } else {
            self.delta.negated()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridOutcome {
    /// Every cell of the delta grid is exactly zero
    NoVariation { metric: HouseholdMetric },
    Delta(DeltaGrid),
}

impl GridOutcome {
    pub fn metric(&self) -> HouseholdMetric {
        match self {
            GridOutcome::NoVariation { metric } => *metric,
            GridOutcome::Delta(grid) => grid.metric,
        }
    }

    pub fn grid(&self) -> Option<&DeltaGrid> {
        match self {
            GridOutcome::NoVariation { .. } => None,
            GridOutcome::Delta(grid) => Some(grid),
        }
    }
}

/// Build the delta grid for one metric.
///
/// The household's incomes are ignored; both adults are swept over `sweep`.
pub fn build_delta_grid<E, P>(
    evaluator: &Evaluator<'_, E, P>,
    household: &Household,
    metric: HouseholdMetric,
    sweep: &SweepSpec,
) -> Result<GridOutcome>
where
    E: CalculationEngine + Sync + ?Sized,
    P: CategoryProvider + Sync + ?Sized,
{
    let mut outcomes = build_delta_grids(evaluator, household, &[metric], sweep)?;
    Ok(outcomes.remove(0))
}

/// Build delta grids for several metrics over one set of loaded scenarios.
pub fn build_delta_grids<E, P>(
    evaluator: &Evaluator<'_, E, P>,
    household: &Household,
    metrics: &[HouseholdMetric],
    sweep: &SweepSpec,
) -> Result<Vec<GridOutcome>>
where
    E: CalculationEngine + Sync + ?Sized,
    P: CategoryProvider + Sync + ?Sized,
{
    sweep.validate()?;
    // The anchor income only bounds the sweep; the axes override it.
    let anchored = household.with_incomes(sweep.max, sweep.max);
    let married = anchored.married_scenario(Some(sweep))?;
    let head_alone = anchored.head_alone_scenario(Some(sweep))?;
    let spouse_alone = anchored.spouse_alone_scenario(Some(sweep))?;

    info!(
        state = %household.state,
        year = household.year,
        count = sweep.count,
        metrics = metrics.len(),
        "building delta grids"
    );

    #[cfg(feature = "parallel")]
    let (married, (head_alone, spouse_alone)) = rayon::join(
        || evaluator.evaluate_series(&married, metrics),
        || {
            rayon::join(
                || evaluator.evaluate_series(&head_alone, metrics),
                || evaluator.evaluate_series(&spouse_alone, metrics),
            )
        },
    );

    #[cfg(not(feature = "parallel"))]
    let (married, head_alone, spouse_alone) = (
        evaluator.evaluate_series(&married, metrics),
        evaluator.evaluate_series(&head_alone, metrics),
        evaluator.evaluate_series(&spouse_alone, metrics),
    );

    let (married, head_alone, spouse_alone) = (married?, head_alone?, spouse_alone?);

    metrics
        .iter()
        .map(|&metric| assemble(metric, sweep, &married, &head_alone, &spouse_alone))
        .collect()
}

fn series_for(
    series: &ProgramSeries,
    metric: HouseholdMetric,
    expected: usize,
) -> std::result::Result<Vec<f64>, GridError> {
    let values = series.get(metric).unwrap_or(&[]);
    if values.len() != expected {
        return Err(GridError::ShapeMismatch {
            variable: metric.variable().to_string(),
            expected,
            actual: values.len(),
        });
    }
    Ok(values.to_vec())
}

fn assemble(
    metric: HouseholdMetric,
    sweep: &SweepSpec,
    married: &ProgramSeries,
    head_alone: &ProgramSeries,
    spouse_alone: &ProgramSeries,
) -> Result<GridOutcome> {
    let count = sweep.count;
    let married = IncomeGrid::reshape(
        metric.variable(),
        count,
        count,
        series_for(married, metric, count * count)?,
    )?;
    let head = series_for(head_alone, metric, count)?;
    let spouse = series_for(spouse_alone, metric, count)?;

    let separate = IncomeGrid::outer_sum(&head, &spouse);
    let delta = married.difference(&separate).ok_or(GridError::AxisMismatch)?;

    if delta.is_all_zero() {
        info!(metric = metric.label(), "delta grid has no variation");
        return Ok(GridOutcome::NoVariation { metric });
    }

    Ok(GridOutcome::Delta(DeltaGrid {
        metric,
        axis: sweep.values(),
        married,
        head,
        spouse,
        separate,
        delta,
    }))
}
