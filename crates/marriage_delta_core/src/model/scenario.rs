//! Scenario documents submitted to the calculation engine
//!
//! A `ScenarioDocument` is the typed form of a household situation: the people
//! in it, the nested membership groups, the jurisdiction and year, and any
//! income sweep axes. `situation()` renders it to the engine's JSON layout,
//! where person and group maps are keyed by name and every per-year value is
//! keyed by the year string.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::household::{StateCode, Year};
use super::sweep::SweepAxis;
use crate::error::ScenarioError;

pub const HEAD: &str = "you";
pub const SPOUSE: &str = "your partner";

/// Person name for child number `n`
pub fn child_name(number: u32) -> String {
    format!("child_{number}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub age: i32,
    pub employment_income: i64,
    pub is_disabled: bool,
}

/// Kinds of membership group an engine scenario carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Family,
    MaritalUnit,
    TaxUnit,
    SpmUnit,
    Household,
}

impl GroupKind {
    pub const ALL: [GroupKind; 5] = [
        GroupKind::Family,
        GroupKind::MaritalUnit,
        GroupKind::TaxUnit,
        GroupKind::SpmUnit,
        GroupKind::Household,
    ];

    /// Singular label used in error messages
    pub fn label(self) -> &'static str {
        match self {
            GroupKind::Family => "family",
            GroupKind::MaritalUnit => "marital unit",
            GroupKind::TaxUnit => "tax unit",
            GroupKind::SpmUnit => "SPM unit",
            GroupKind::Household => "household",
        }
    }

    /// Key of the group map in the engine situation
    pub fn plural_key(self) -> &'static str {
        match self {
            GroupKind::Family => "families",
            GroupKind::MaritalUnit => "marital_units",
            GroupKind::TaxUnit => "tax_units",
            GroupKind::SpmUnit => "spm_units",
            GroupKind::Household => "households",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub members: Vec<String>,
    /// Set on the per-child marital units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_unit_id: Option<u32>,
}

impl Group {
    pub fn new(name: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            name: name.into(),
            members,
            marital_unit_id: None,
        }
    }
}

/// A complete household scenario for one jurisdiction and year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDocument {
    pub year: Year,
    pub state: StateCode,
    /// People in declaration order; sweep axis indices refer to this order.
    pub people: Vec<Person>,
    pub families: Vec<Group>,
    pub marital_units: Vec<Group>,
    pub tax_units: Vec<Group>,
    pub spm_units: Vec<Group>,
    pub households: Vec<Group>,
    /// Each axis is its own sweep dimension.
    #[serde(default)]
    pub axes: Vec<SweepAxis>,
}

impl ScenarioDocument {
    pub fn groups(&self, kind: GroupKind) -> &[Group] {
        match kind {
            GroupKind::Family => &self.families,
            GroupKind::MaritalUnit => &self.marital_units,
            GroupKind::TaxUnit => &self.tax_units,
            GroupKind::SpmUnit => &self.spm_units,
            GroupKind::Household => &self.households,
        }
    }

    pub fn person(&self, name: &str) -> Option<&Person> {
        self.people.iter().find(|p| p.name == name)
    }

    pub fn is_sweep(&self) -> bool {
        !self.axes.is_empty()
    }

    /// Number of sample points the engine evaluates (1 without axes)
    ///
    /// Saturates for documents whose axes have not been validated.
    pub fn sample_count(&self) -> usize {
        self.axes
            .iter()
            .fold(1usize, |total, axis| total.saturating_mul(axis.count))
    }

    /// Adults are always declared before any child.
    fn adult_count(&self) -> usize {
        self.people
            .iter()
            .take_while(|p| p.name == HEAD || p.name == SPOUSE)
            .count()
    }

    /// Check every structural invariant of the document.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.people.is_empty() {
            return Err(ScenarioError::NoPeople);
        }

        let mut declared: FxHashMap<&str, usize> = FxHashMap::default();
        for person in &self.people {
            if declared.insert(person.name.as_str(), 0).is_some() {
                return Err(ScenarioError::DuplicatePerson(person.name.clone()));
            }
            if person.employment_income < 0 {
                return Err(ScenarioError::NegativeIncome {
                    person: person.name.clone(),
                    income: person.employment_income,
                });
            }
            if person.age < 0 {
                return Err(ScenarioError::NegativeAge {
                    person: person.name.clone(),
                    age: person.age,
                });
            }
        }

        for kind in GroupKind::ALL {
            let groups = self.groups(kind);
            if groups.is_empty() {
                return Err(ScenarioError::MissingGroup(kind.label()));
            }

            let mut counts = declared.clone();
            for group in groups {
                if group.members.is_empty() {
                    return Err(ScenarioError::EmptyGroup {
                        kind: kind.label(),
                        group: group.name.clone(),
                    });
                }
                for member in &group.members {
                    match counts.get_mut(member.as_str()) {
                        Some(count) => *count += 1,
                        None => {
                            return Err(ScenarioError::UndeclaredMember {
                                kind: kind.label(),
                                group: group.name.clone(),
                                person: member.clone(),
                            });
                        }
                    }
                }
            }

            // Walk people in declaration order so the reported person is stable.
            for person in &self.people {
                let count = counts[person.name.as_str()];
                if count != 1 {
                    return Err(ScenarioError::MembershipCount {
                        kind: kind.label(),
                        person: person.name.clone(),
                        count,
                    });
                }
            }
        }

        self.validate_axes()
    }

    fn validate_axes(&self) -> Result<(), ScenarioError> {
        let Some(first) = self.axes.first() else {
            return Ok(());
        };
        for axis in &self.axes {
            axis.spec().validate()?;
            if axis.spec() != first.spec() || axis.name != first.name {
                return Err(ScenarioError::InvalidSweep(
                    "all axes must share the same variable, count and range".to_string(),
                ));
            }
            match axis.index {
                Some(index) if index >= self.adult_count() => {
                    return Err(ScenarioError::InvalidSweep(format!(
                        "axis index {index} does not refer to an adult ({} declared)",
                        self.adult_count()
                    )));
                }
                _ => {}
            }
        }
        if self.axes.len() > 1 {
            let mut seen = Vec::with_capacity(self.axes.len());
            for axis in &self.axes {
                match axis.index {
                    Some(index) if !seen.contains(&index) => seen.push(index),
                    Some(index) => {
                        return Err(ScenarioError::InvalidSweep(format!(
                            "person index {index} is swept by more than one axis"
                        )));
                    }
                    None => {
                        return Err(ScenarioError::InvalidSweep(
                            "every axis of a multi-axis sweep needs a person index".to_string(),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Render the engine's JSON situation.
    pub fn situation(&self) -> Value {
        let period = self.year.to_string();

        let mut people = Map::new();
        for person in &self.people {
            people.insert(
                person.name.clone(),
                json!({
                    "age": { &period: person.age },
                    "employment_income": { &period: person.employment_income },
                    "is_disabled": { &period: person.is_disabled },
                }),
            );
        }

        let mut situation = Map::new();
        situation.insert("people".to_string(), Value::Object(people));

        for kind in GroupKind::ALL {
            let mut groups = Map::new();
            for group in self.groups(kind) {
                let mut entry = Map::new();
                entry.insert("members".to_string(), json!(group.members));
                if let Some(id) = group.marital_unit_id {
                    entry.insert("marital_unit_id".to_string(), json!({ &period: id }));
                }
                if kind == GroupKind::Household {
                    entry.insert(
                        "state_name".to_string(),
                        json!({ &period: self.state.as_str() }),
                    );
                }
                groups.insert(group.name.clone(), Value::Object(entry));
            }
            situation.insert(kind.plural_key().to_string(), Value::Object(groups));
        }

        if !self.axes.is_empty() {
            let axes: Vec<Value> = self
                .axes
                .iter()
                .map(|axis| {
                    let mut entry = json!({
                        "name": axis.name,
                        "count": axis.count,
                        "min": axis.min,
                        "max": axis.max,
                        "period": &period,
                    });
                    if let (Some(index), Some(obj)) = (axis.index, entry.as_object_mut()) {
                        obj.insert("index".to_string(), json!(index));
                    }
                    json!([entry])
                })
                .collect();
            situation.insert("axes".to_string(), Value::Array(axes));
        }

        Value::Object(situation)
    }
}
