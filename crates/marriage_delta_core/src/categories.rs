//! Category sets: which fiscal variables make up each household total
//!
//! A `CategoryProvider` maps a jurisdiction and year to three ordered lists of
//! variable names. `CategoryCatalog` is the declarative provider, read from
//! YAML; a catalog is bundled with the crate and can be replaced by a file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{Category, StateCode, Year};

const BUILTIN_CATALOG: &str = include_str!("categories.yaml");

/// Variable names for each category, federal lists first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySet {
    pub benefits: Vec<String>,
    pub refundable_credits: Vec<String>,
    pub taxes_before_refundable_credits: Vec<String>,
}

impl CategorySet {
    pub fn variables(&self, category: Category) -> &[String] {
        match category {
            Category::Benefits => &self.benefits,
            Category::RefundableCredits => &self.refundable_credits,
            Category::TaxesBeforeRefundableCredits => &self.taxes_before_refundable_credits,
        }
    }
}

pub trait CategoryProvider {
    fn categories(&self, state: &StateCode, year: Year) -> CategorySet;
}

/// A fixed set serves every jurisdiction and year.
impl CategoryProvider for CategorySet {
    fn categories(&self, _state: &StateCode, _year: Year) -> CategorySet {
        self.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read category catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse category catalog: {0}")]
    Parse(String),
}

/// Variable lists keyed by the first year they apply to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YearlyList(BTreeMap<Year, Vec<String>>);

impl YearlyList {
    pub fn new(entries: BTreeMap<Year, Vec<String>>) -> Self {
        Self(entries)
    }

    /// The latest list starting on or before `year`.
    ///
    /// Years earlier than every entry fall back to the newest list.
    pub fn effective(&self, year: Year) -> &[String] {
        self.0
            .range(..=year)
            .next_back()
            .or_else(|| self.0.iter().next_back())
            .map(|(_, names)| names.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLists {
    #[serde(default)]
    pub benefits: YearlyList,
    #[serde(default)]
    pub refundable_credits: YearlyList,
    #[serde(default)]
    pub taxes_before_refundable_credits: YearlyList,
}

/// Declarative federal and per-state category lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCatalog {
    #[serde(default)]
    pub federal: CategoryLists,
    /// Keyed by two-letter state code
    #[serde(default)]
    pub states: BTreeMap<String, CategoryLists>,
}

impl CategoryCatalog {
    /// The catalog bundled with the crate
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        serde_saphyr::from_str(yaml).map_err(|e| CatalogError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    fn state(&self, state: &StateCode) -> Option<&CategoryLists> {
        self.states
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(state.as_str()))
            .map(|(_, lists)| lists)
    }
}

impl CategoryProvider for CategoryCatalog {
    fn categories(&self, state: &StateCode, year: Year) -> CategorySet {
        let state_lists = self.state(state);
        let combine = |federal: &YearlyList, pick: fn(&CategoryLists) -> &YearlyList| {
            let mut names: Vec<String> = federal.effective(year).to_vec();
            if let Some(lists) = state_lists {
                for name in pick(lists).effective(year) {
                    if !names.contains(name) {
                        names.push(name.clone());
                    }
                }
            }
            names
        };

        CategorySet {
            benefits: combine(&self.federal.benefits, |l| &l.benefits),
            refundable_credits: combine(&self.federal.refundable_credits, |l| {
                &l.refundable_credits
            }),
            taxes_before_refundable_credits: combine(
                &self.federal.taxes_before_refundable_credits,
                |l| &l.taxes_before_refundable_credits,
            ),
        }
    }
}
