//! spritemerge configuration library
//!
//! This crate provides the configuration, metadata and validation types shared
//! by the atlas backend and the command-line tool.
//!
//! # Example
//!
//! ```
//! use spritemerge_spec::{Alignment, AtlasConfig, MergeConfig};
//! use spritemerge_spec::validation::validate_config;
//!
//! let config = MergeConfig {
//!     atlas: AtlasConfig::vertical().with_alignment(Alignment::End),
//!     ..MergeConfig::default()
//! };
//!
//! assert!(validate_config(&config).is_ok());
//! ```
//!
//! # Modules
//!
//! - [`config`]: Axis, alignment, floor and output settings
//! - [`metadata`]: Sidecar document describing cell placements
//! - [`validation`]: Config validation functions
//! - [`error`]: Error and warning types

pub mod config;
pub mod error;
pub mod metadata;
pub mod validation;

pub use config::{
    Alignment, AtlasConfig, Axis, CellFloor, CompressionPreset, FloorPolicy, MergeConfig,
    OutputSettings,
};
pub use error::{
    ConfigError, ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode,
};
pub use metadata::{AtlasMetadata, CellPlacement};
pub use validation::validate_config;
