mod household;
mod results;
mod scenario;
mod sweep;

pub use household::{DEFAULT_AGE, DisabilityFlags, Household, StateCode, Year};
pub use results::{
    Category, CategoryBreakdown, HouseholdMetric, ProgramAmount, ProgramResult, ProgramSeries,
};
pub use scenario::{Group, GroupKind, HEAD, Person, SPOUSE, ScenarioDocument, child_name};
pub use sweep::{MAX_SWEEP_COUNT, SWEEP_VARIABLE, SweepAxis, SweepSpec};
