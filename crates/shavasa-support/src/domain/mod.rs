//! Domain layer
//!
//! Records, their schemas and ticket queries.

pub mod aggregates;
pub mod query;
pub mod schema;
pub mod value_objects;
