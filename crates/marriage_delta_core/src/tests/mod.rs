//! Integration tests for the comparison engine
//!
//! Tests are organized by component:
//! - `builder` - scenario construction and validation
//! - `evaluate` - engine extraction and category downgrading
//! - `compare` - married vs separate aggregation
//! - `grid` - sweep reshaping and delta grids
//!
//! `mock` holds the deterministic engine every test runs against.

mod compare;
mod mock;
