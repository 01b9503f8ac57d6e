//! Comparative household scenario engine
//!
//! This crate measures the marriage penalty or bonus for a household: how
//! filing as a married couple changes net income, benefits, refundable credits
//! and taxes compared with the same two adults filing as singles.
//! It supports:
//! - Point comparisons with per-program breakdowns
//! - Income sweeps over both adults, reshaped into delta grids
//! - Year-aware federal and state program catalogs
//!
//! The tax-and-benefit rules themselves live behind [`engine::CalculationEngine`].
//!
//! # Example
//!
//! ```ignore
//! use marriage_delta_core::{CategoryCatalog, Evaluator, Household, StateCode, compare};
//!
//! let household = Household::new(StateCode::new("CA")?, 50_000, 30_000, 2024)
//!     .with_child(1, 6);
//! let catalog = CategoryCatalog::builtin()?;
//! let evaluator = Evaluator::new(&engine, &catalog);
//! let result = compare(&evaluator, &household)?;
//! println!("{:?}", result.outcome());
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod builder;
pub mod categories;
pub mod compare;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod grid;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use builder::ScenarioBuilder;
pub use categories::{CategoryCatalog, CategoryProvider, CategorySet};
pub use compare::{CHILDREN_ASSUMPTION, ComparativeResult, MarriageOutcome, compare};
pub use engine::{CalculationEngine, EngineValue, MapTo, Simulation};
pub use error::{EngineError, EvaluationError, GridError, ScenarioError};
pub use evaluate::Evaluator;
pub use grid::{DeltaGrid, GridOutcome, IncomeGrid, build_delta_grid, build_delta_grids};
pub use model::{Household, HouseholdMetric, StateCode, SweepSpec};
