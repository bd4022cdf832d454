//! Query construction and result hydration.
//!
//! Turns an equality [`Filter`] into a parameterized [`Query`] and decodes
//! the database's statement results back into entity instances.

mod builder;
mod filter;
mod response;

pub use builder::{select, Query, Select, TABLE_PARAM};
pub use filter::{Condition, Filter, FilterValue};
pub use response::{first_payload, first_rows, first_statement, hydrate_all, hydrate_first};
