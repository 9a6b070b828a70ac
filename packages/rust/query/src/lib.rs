//! Query resolution for healthpull extractions.
//!
//! Turns user-facing parameters (country, level, date range, identifier
//! lists) into immutable query specifications, via deterministic period
//! expansion and the static lookup tables. Everything here runs before the
//! first network call so configuration errors fail fast.

pub mod lookup;
pub mod period;
pub mod spec;

pub use lookup::{CountryTable, Level, LevelTable, LookupTables};
pub use period::period_range;
pub use spec::{OrgUnitQuery, ValueQuery};
