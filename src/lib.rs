//! Health dataset dashboard: load a tabular health dataset, filter it by
//! gender, location and race/ethnicity flag, and summarise it for charts.

pub mod data;
pub mod state;

pub use data::aggregate::{Dashboard, Summary, Unavailable};
pub use data::filter::{Choice, FilterOptions, FilterSelection, View};
pub use data::loader::{load, LoadError};
pub use data::model::{Condition, Flag, HealthRecord, HealthTable, Schema};
