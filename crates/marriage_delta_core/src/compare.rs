//! Comparative Aggregator
//!
//! Evaluates a household three times (married, head alone with the children,
//! spouse alone without children) and differences married against the sum of
//! the two single filers.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::categories::CategoryProvider;
use crate::engine::CalculationEngine;
use crate::error::Result;
use crate::evaluate::Evaluator;
use crate::model::{Category, HouseholdMetric, Household, ProgramResult};

/// Stated assumption of the separate-filing baseline
pub const CHILDREN_ASSUMPTION: &str =
    "When filing separately, all children are assumed to be claimed by the head of household.";

/// `delta / separate`, defined as 0 when `separate` is 0
pub fn delta_percent(married: i64, separate: i64) -> f64 {
    if separate == 0 {
        0.0
    } else {
        (married - separate) as f64 / separate as f64
    }
}

/// Whether marriage raises or lowers net income
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarriageOutcome {
    Bonus,
    Penalty,
    Neutral,
}

impl MarriageOutcome {
    pub fn from_delta(delta: i64) -> Self {
        match delta.signum() {
            1 => MarriageOutcome::Bonus,
            -1 => MarriageOutcome::Penalty,
            _ => MarriageOutcome::Neutral,
        }
    }
}

/// One presentable line of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub program: String,
    pub married: i64,
    pub separate: i64,
    pub delta: i64,
    /// Fraction of the separate amount, not a percentage
    pub delta_percent: f64,
}

impl ComparisonRow {
    pub fn new(program: impl Into<String>, married: i64, separate: i64) -> Self {
        Self {
            program: program.into(),
            married,
            separate,
            delta: married - separate,
            delta_percent: delta_percent(married, separate),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.married == 0 && self.separate == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Section {
    Summary,
    Category(Category),
}

impl Section {
    pub fn title(self) -> &'static str {
        match self {
            Section::Summary => "Summary",
            Section::Category(category) => category.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSection {
    pub section: Section,
    pub rows: Vec<ComparisonRow>,
}

/// Summary rows followed by the non-zero rows of each category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub sections: Vec<TableSection>,
}

impl ComparisonTable {
    pub fn section(&self, section: Section) -> Option<&TableSection> {
        self.sections.iter().find(|s| s.section == section)
    }
}

/// Married versus separate outcome for one household
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparativeResult {
    pub married: ProgramResult,
    pub head_alone: ProgramResult,
    pub spouse_alone: ProgramResult,
    /// `head_alone + spouse_alone`
    pub separate: ProgramResult,
}

impl ComparativeResult {
    pub fn new(married: ProgramResult, head_alone: ProgramResult, spouse_alone: ProgramResult) -> Self {
        let separate = head_alone.combine(&spouse_alone);
        Self {
            married,
            head_alone,
            spouse_alone,
            separate,
        }
    }

    pub fn delta(&self, metric: HouseholdMetric) -> i64 {
        self.married.metric(metric) - self.separate.metric(metric)
    }

    pub fn delta_percent(&self, metric: HouseholdMetric) -> f64 {
        delta_percent(self.married.metric(metric), self.separate.metric(metric))
    }

    pub fn outcome(&self) -> MarriageOutcome {
        MarriageOutcome::from_delta(self.delta(HouseholdMetric::NetIncome))
    }

    pub fn summary_rows(&self) -> Vec<ComparisonRow> {
        HouseholdMetric::ALL
            .iter()
            .map(|&m| ComparisonRow::new(m.label(), self.married.metric(m), self.separate.metric(m)))
            .collect()
    }

    /// Every program in the category, zero rows included
    pub fn category_rows(&self, category: Category) -> Vec<ComparisonRow> {
        let married = self.married.breakdown(category);
        let separate = self.separate.breakdown(category);
        // Merge to cover programs present on one side only; zero fills the gap.
        married
            .merge_with(separate, |m, _| m)
            .iter()
            .map(|e| {
                ComparisonRow::new(
                    e.program.clone(),
                    e.amount,
                    separate.get(&e.program).unwrap_or(0),
                )
            })
            .collect()
    }

    /// Presentation table: summary rows always, category rows unless both
    /// married and separate amounts are zero.
    pub fn table(&self) -> ComparisonTable {
        let mut sections = vec![TableSection {
            section: Section::Summary,
            rows: self.summary_rows(),
        }];
        for category in Category::ALL {
            sections.push(TableSection {
                section: Section::Category(category),
                rows: self
                    .category_rows(category)
                    .into_iter()
                    .filter(|row| !row.is_zero())
                    .collect(),
            });
        }
        ComparisonTable { sections }
    }
}

/// Compare filing married against filing as two singles.
///
/// All three scenarios are built (and validated) before the engine is called.
pub fn compare<E, P>(evaluator: &Evaluator<'_, E, P>, household: &Household) -> Result<ComparativeResult>
where
    E: CalculationEngine + Sync + ?Sized,
    P: CategoryProvider + Sync + ?Sized,
{
    let married = household.married_scenario(None)?;
    let head_alone = household.head_alone_scenario(None)?;
    let spouse_alone = household.spouse_alone_scenario(None)?;

    info!(
        state = %household.state,
        year = household.year,
        head_income = household.head_income,
        spouse_income = household.spouse_income,
        children = household.children.len(),
        "comparing married and separate filing"
    );

    #[cfg(feature = "parallel")]
    let (married, (head_alone, spouse_alone)) = rayon::join(
        || evaluator.evaluate(&married),
        || {
            rayon::join(
                || evaluator.evaluate(&head_alone),
                || evaluator.evaluate(&spouse_alone),
            )
        },
    );

    #[cfg(not(feature = "parallel"))]
    let (married, head_alone, spouse_alone) = (
        evaluator.evaluate(&married),
        evaluator.evaluate(&head_alone),
        evaluator.evaluate(&spouse_alone),
    );

    let result = ComparativeResult::new(married?, head_alone?, spouse_alone?);
    info!(
        delta = result.delta(HouseholdMetric::NetIncome),
        outcome = ?result.outcome(),
        "comparison complete"
    );
    Ok(result)
}
