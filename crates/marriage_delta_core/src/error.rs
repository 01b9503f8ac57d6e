use std::time::Duration;

/// Errors raised while building or validating a scenario document.
///
/// These are always detected before the calculation engine is contacted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScenarioError {
    #[error("employment income for {person} must not be negative (got {income})")]
    NegativeIncome { person: String, income: i64 },

    #[error("age for {person} must not be negative (got {age})")]
    NegativeAge { person: String, age: i32 },

    #[error("invalid state code {0:?}: expected two ASCII letters")]
    InvalidStateCode(String),

    #[error("scenario declares no people")]
    NoPeople,

    #[error("person {0} is declared more than once")]
    DuplicatePerson(String),

    #[error("scenario has no {0}")]
    MissingGroup(&'static str),

    #[error("{kind} {group:?} has an empty membership list")]
    EmptyGroup { kind: &'static str, group: String },

    #[error("{kind} {group:?} references undeclared person {person}")]
    UndeclaredMember {
        kind: &'static str,
        group: String,
        person: String,
    },

    #[error("person {person} belongs to {count} {kind} groups (expected exactly one)")]
    MembershipCount {
        kind: &'static str,
        person: String,
        count: usize,
    },

    #[error("invalid sweep: {0}")]
    InvalidSweep(String),
}

/// Errors reported by the calculation engine boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The engine cannot evaluate this variable for the jurisdiction/year.
    #[error("variable {variable} is unavailable: {reason}")]
    Unavailable { variable: String, reason: String },

    #[error("engine call for {variable} timed out after {elapsed:?}")]
    Timeout { variable: String, elapsed: Duration },

    /// The engine itself could not be reached or misbehaved.
    #[error("calculation engine failed: {0}")]
    Failed(String),
}

/// Errors related to reshaping sweep output into grids
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("{variable} returned {actual} values, expected {expected}")]
    ShapeMismatch {
        variable: String,
        expected: usize,
        actual: usize,
    },

    #[error("married and separate grids differ in shape")]
    AxisMismatch,
}

/// Umbrella error for a scenario evaluation, comparison or grid request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("invalid scenario: {0}")]
    InvalidScenario(#[from] ScenarioError),

    #[error("engine unavailable: {0}")]
    EngineUnavailable(#[from] EngineError),

    #[error("grid shape mismatch: {0}")]
    GridShapeMismatch(#[from] GridError),
}

pub type Result<T> = std::result::Result<T, EvaluationError>;
