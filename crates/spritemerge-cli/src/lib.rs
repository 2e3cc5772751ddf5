//! spritemerge CLI library
//!
//! The `spritemerge` binary is a thin clap front end over these modules.
//! They are exposed as a library so the merge pipeline can be driven from
//! integration tests with a custom collector or writer.

pub mod collector;
pub mod commands;
pub mod floor_state;
pub mod logging;
pub mod settings;
