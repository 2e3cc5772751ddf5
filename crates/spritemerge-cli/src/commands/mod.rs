//! CLI command implementations

pub mod merge;
pub mod validate;

mod reporting;
