//! Evaluation and comparison results
//!
//! Amounts are whole currency units. The engine reports floating point values;
//! they are truncated toward zero when a point evaluation is extracted.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// The four household aggregates every evaluation extracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HouseholdMetric {
    NetIncome,
    Benefits,
    RefundableCredits,
    TaxBeforeRefundableCredits,
}

impl HouseholdMetric {
    pub const ALL: [HouseholdMetric; 4] = [
        HouseholdMetric::NetIncome,
        HouseholdMetric::Benefits,
        HouseholdMetric::RefundableCredits,
        HouseholdMetric::TaxBeforeRefundableCredits,
    ];

    /// Engine variable holding the household total
    pub fn variable(self) -> &'static str {
        match self {
            HouseholdMetric::NetIncome => "household_net_income",
            HouseholdMetric::Benefits => "household_benefits",
            HouseholdMetric::RefundableCredits => "household_refundable_tax_credits",
            HouseholdMetric::TaxBeforeRefundableCredits => {
                "household_tax_before_refundable_credits"
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HouseholdMetric::NetIncome => "Net Income",
            HouseholdMetric::Benefits => "Benefits",
            HouseholdMetric::RefundableCredits => "Refundable Tax Credits",
            HouseholdMetric::TaxBeforeRefundableCredits => "Tax Before Refundable Credits",
        }
    }

    /// Whether a larger value leaves the household better off.
    ///
    /// Only taxes run the other way; displays flip their sign so every metric
    /// reads "larger is better".
    pub fn higher_is_better(self) -> bool {
        !matches!(self, HouseholdMetric::TaxBeforeRefundableCredits)
    }
}

/// Amount attributed to one program within a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramAmount {
    pub program: String,
    pub amount: i64,
}

/// Per-program decomposition of a category total, in category order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryBreakdown {
    entries: Vec<ProgramAmount>,
}

impl CategoryBreakdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a program's amount, keeping its original position if already present
    pub fn insert(&mut self, program: impl Into<String>, amount: i64) {
        let program = program.into();
        match self.entries.iter_mut().find(|e| e.program == program) {
            Some(entry) => entry.amount = amount,
            None => self.entries.push(ProgramAmount { program, amount }),
        }
    }

    pub fn get(&self, program: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|e| e.program == program)
            .map(|e| e.amount)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProgramAmount> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> i64 {
        self.entries.iter().map(|e| e.amount).sum()
    }

    /// Combine two breakdowns key by key.
    ///
    /// Programs present on only one side take zero for the other. Order is
    /// this breakdown's programs followed by any new ones from `other`.
    #[must_use]
    pub fn merge_with(&self, other: &Self, combine: impl Fn(i64, i64) -> i64) -> Self {
        let index: FxHashMap<&str, i64> = other
            .entries
            .iter()
            .map(|e| (e.program.as_str(), e.amount))
            .collect();

        let mut entries: Vec<ProgramAmount> = self
            .entries
            .iter()
            .map(|e| ProgramAmount {
                program: e.program.clone(),
                amount: combine(e.amount, index.get(e.program.as_str()).copied().unwrap_or(0)),
            })
            .collect();

        for e in &other.entries {
            if self.get(&e.program).is_none() {
                entries.push(ProgramAmount {
                    program: e.program.clone(),
                    amount: combine(0, e.amount),
                });
            }
        }

        Self { entries }
    }

    #[must_use]
    pub fn sum(&self, other: &Self) -> Self {
        self.merge_with(other, |a, b| a + b)
    }
}

impl FromIterator<(String, i64)> for CategoryBreakdown {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        let mut breakdown = Self::new();
        for (program, amount) in iter {
            breakdown.insert(program, amount);
        }
        breakdown
    }
}

/// The three category breakdowns carried by a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Benefits,
    RefundableCredits,
    TaxesBeforeRefundableCredits,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Benefits,
        Category::RefundableCredits,
        Category::TaxesBeforeRefundableCredits,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Benefits => "Benefits",
            Category::RefundableCredits => "Refundable Credits",
            Category::TaxesBeforeRefundableCredits => "Taxes Before Refundable Credits",
        }
    }
}

/// Fiscal outcome of evaluating one scenario
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramResult {
    pub net_income: i64,
    pub benefits: i64,
    pub refundable_credits: i64,
    pub tax_before_refundable_credits: i64,
    pub taxes: CategoryBreakdown,
    pub benefit_programs: CategoryBreakdown,
    pub credits: CategoryBreakdown,
}

impl ProgramResult {
    pub fn metric(&self, metric: HouseholdMetric) -> i64 {
        match metric {
            HouseholdMetric::NetIncome => self.net_income,
            HouseholdMetric::Benefits => self.benefits,
            HouseholdMetric::RefundableCredits => self.refundable_credits,
            HouseholdMetric::TaxBeforeRefundableCredits => self.tax_before_refundable_credits,
        }
    }

    pub fn breakdown(&self, category: Category) -> &CategoryBreakdown {
        match category {
            Category::Benefits => &self.benefit_programs,
            Category::RefundableCredits => &self.credits,
            Category::TaxesBeforeRefundableCredits => &self.taxes,
        }
    }

    /// Field-wise and category-wise sum of two results
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            net_income: self.net_income + other.net_income,
            benefits: self.benefits + other.benefits,
            refundable_credits: self.refundable_credits + other.refundable_credits,
            tax_before_refundable_credits: self.tax_before_refundable_credits
                + other.tax_before_refundable_credits,
            taxes: self.taxes.sum(&other.taxes),
            benefit_programs: self.benefit_programs.sum(&other.benefit_programs),
            credits: self.credits.sum(&other.credits),
        }
    }
}

/// Vector output of a sweep scenario, one entry per sample point
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramSeries {
    pub metrics: Vec<(HouseholdMetric, Vec<f64>)>,
}

impl ProgramSeries {
    pub fn get(&self, metric: HouseholdMetric) -> Option<&[f64]> {
        self.metrics
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|(_, values)| values.as_slice())
    }
}
