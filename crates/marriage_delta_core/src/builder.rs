//! Scenario Builder
//!
//! Turns a household description into a `ScenarioDocument` for the married,
//! head-alone or spouse-alone configuration, with or without income sweep axes.
//!
//! # Example
//!
//! ```ignore
//! use marriage_delta_core::builder::ScenarioBuilder;
//! use marriage_delta_core::model::{StateCode, SweepSpec};
//!
//! let scenario = ScenarioBuilder::new(StateCode::new("CA")?, 2024)
//!     .head(40_000, false)
//!     .spouse(40_000, false)
//!     .child(1, 6, false)
//!     .sweep(SweepSpec::default())
//!     .build()?;
//! ```
//!
//! In the separate-filing comparison every child is attributed to the head.
//! That is a product assumption of the comparison, not a statement of tax law.

use std::collections::BTreeMap;

use crate::error::ScenarioError;
use crate::model::{
    DEFAULT_AGE, DisabilityFlags, Group, HEAD, Household, Person, SPOUSE, ScenarioDocument,
    StateCode, SweepSpec, Year, child_name,
};

#[derive(Debug, Clone, Copy)]
struct Adult {
    income: i64,
    disabled: bool,
}

#[derive(Debug, Clone, Copy)]
struct Child {
    age: i32,
    disabled: bool,
}

/// Fluent builder for scenario documents
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    state: StateCode,
    year: Year,
    head: Option<Adult>,
    spouse: Option<Adult>,
    children: BTreeMap<u32, Child>,
    sweep: Option<SweepSpec>,
}

impl ScenarioBuilder {
    #[must_use]
    pub fn new(state: StateCode, year: Year) -> Self {
        Self {
            state,
            year,
            head: None,
            spouse: None,
            children: BTreeMap::new(),
            sweep: None,
        }
    }

    #[must_use]
    pub fn head(mut self, income: i64, disabled: bool) -> Self {
        self.head = Some(Adult { income, disabled });
        self
    }

    #[must_use]
    pub fn spouse(mut self, income: i64, disabled: bool) -> Self {
        self.spouse = Some(Adult { income, disabled });
        self
    }

    /// Add child number `number`; children have no employment income.
    #[must_use]
    pub fn child(mut self, number: u32, age: i32, disabled: bool) -> Self {
        self.children.insert(number, Child { age, disabled });
        self
    }

    #[must_use]
    pub fn sweep(mut self, spec: SweepSpec) -> Self {
        self.sweep = Some(spec);
        self
    }

    pub fn build(self) -> Result<ScenarioDocument, ScenarioError> {
        let head = self.head.ok_or(ScenarioError::NoPeople)?;

        let mut people = Vec::with_capacity(2 + self.children.len());
        people.push(adult(HEAD, head)?);
        if let Some(spouse) = self.spouse {
            people.push(adult(SPOUSE, spouse)?);
        }
        let adults: Vec<String> = people.iter().map(|p| p.name.clone()).collect();

        let mut child_units = Vec::with_capacity(self.children.len());
        for (&number, child) in &self.children {
            let name = child_name(number);
            if child.age < 0 {
                return Err(ScenarioError::NegativeAge {
                    person: name,
                    age: child.age,
                });
            }
            people.push(Person {
                name: name.clone(),
                age: child.age,
                employment_income: 0,
                is_disabled: child.disabled,
            });
            child_units.push(Group {
                name: format!("{name}'s marital unit"),
                members: vec![name],
                marital_unit_id: Some(number),
            });
        }

        let members: Vec<String> = people.iter().map(|p| p.name.clone()).collect();

        let mut marital_units = vec![Group::new("your marital unit", adults)];
        marital_units.extend(child_units);

        let axes = match self.sweep {
            Some(spec) => {
                spec.validate()?;
                if self.spouse.is_some() {
                    vec![spec.axis_for(0), spec.axis_for(1)]
                } else {
                    vec![spec.axis()]
                }
            }
            None => Vec::new(),
        };

        let scenario = ScenarioDocument {
            year: self.year,
            state: self.state,
            people,
            families: vec![Group::new("your family", members.clone())],
            marital_units,
            tax_units: vec![Group::new("your tax unit", members.clone())],
            spm_units: vec![Group::new("your spm_unit", members.clone())],
            households: vec![Group::new("your household", members)],
            axes,
        };
        scenario.validate()?;
        Ok(scenario)
    }
}

fn adult(name: &str, adult: Adult) -> Result<Person, ScenarioError> {
    if adult.income < 0 {
        return Err(ScenarioError::NegativeIncome {
            person: name.to_string(),
            income: adult.income,
        });
    }
    Ok(Person {
        name: name.to_string(),
        age: DEFAULT_AGE,
        employment_income: adult.income,
        is_disabled: adult.disabled,
    })
}

/// Build a scenario from its parts.
///
/// Without a spouse income the scenario holds only the head and the children,
/// and the spouse disability flag is not read.
pub fn build_scenario(
    state: &StateCode,
    head_income: i64,
    spouse_income: Option<i64>,
    children: &BTreeMap<u32, i32>,
    disability: &DisabilityFlags,
    year: Year,
    sweep: Option<&SweepSpec>,
) -> Result<ScenarioDocument, ScenarioError> {
    let mut builder = ScenarioBuilder::new(state.clone(), year).head(head_income, disability.head);
    if let Some(income) = spouse_income {
        builder = builder.spouse(income, disability.spouse);
    }
    for (&number, &age) in children {
        builder = builder.child(number, age, disability.child(number));
    }
    if let Some(spec) = sweep {
        builder = builder.sweep(*spec);
    }
    builder.build()
}

impl Household {
    /// Both adults in one marital and tax unit, with all children
    pub fn married_scenario(
        &self,
        sweep: Option<&SweepSpec>,
    ) -> Result<ScenarioDocument, ScenarioError> {
        build_scenario(
            &self.state,
            self.head_income,
            Some(self.spouse_income),
            &self.children,
            &self.disability,
            self.year,
            sweep,
        )
    }

    /// The head filing alone with every child
    pub fn head_alone_scenario(
        &self,
        sweep: Option<&SweepSpec>,
    ) -> Result<ScenarioDocument, ScenarioError> {
        build_scenario(
            &self.state,
            self.head_income,
            None,
            &self.children,
            &self.disability,
            self.year,
            sweep,
        )
    }

    /// The spouse filing alone as head of a childless household
    pub fn spouse_alone_scenario(
        &self,
        sweep: Option<&SweepSpec>,
    ) -> Result<ScenarioDocument, ScenarioError> {
        build_scenario(
            &self.state,
            self.spouse_income,
            None,
            &BTreeMap::new(),
            &self.disability.spouse_as_head(),
            self.year,
            sweep,
        )
    }
}
