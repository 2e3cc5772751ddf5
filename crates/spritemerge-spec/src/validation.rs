//! Config validation logic.

use crate::config::{FloorPolicy, MergeConfig};
use crate::error::{ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode};

/// Largest width or height a PNG image may declare (2^31 - 1).
pub const MAX_PNG_DIMENSION: u32 = i32::MAX as u32;

/// Validates a merge config and returns a validation result.
///
/// # Example
/// ```
/// use spritemerge_spec::{MergeConfig, validation::validate_config};
///
/// let result = validate_config(&MergeConfig::default());
/// assert!(result.is_ok());
/// assert!(result.warnings.is_empty());
/// ```
pub fn validate_config(config: &MergeConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    validate_floor(config, &mut result);
    validate_output(config, &mut result);

    result
}

fn validate_floor(config: &MergeConfig, result: &mut ValidationResult) {
    let floor = &config.atlas.floor;

    if floor.width > MAX_PNG_DIMENSION {
        result.add_error(ValidationError::with_path(
            ErrorCode::FloorTooLarge,
            format!(
                "floor width {} exceeds the PNG limit of {}",
                floor.width, MAX_PNG_DIMENSION
            ),
            "atlas.floor.width",
        ));
    }
    if floor.height > MAX_PNG_DIMENSION {
        result.add_error(ValidationError::with_path(
            ErrorCode::FloorTooLarge,
            format!(
                "floor height {} exceeds the PNG limit of {}",
                floor.height, MAX_PNG_DIMENSION
            ),
            "atlas.floor.height",
        ));
    }

    if config.atlas.floor_policy == FloorPolicy::Accumulate {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::AccumulatingFloor,
            "cell floor is stored in the output directory and only ever grows between runs",
            "atlas.floor_policy",
        ));
        if !floor.is_zero() {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::SeededAccumulatingFloor,
                format!(
                    "initial floor {}x{} only seeds the accumulated floor",
                    floor.width, floor.height
                ),
                "atlas.floor",
            ));
        }
    }
}

fn validate_output(config: &MergeConfig, result: &mut ValidationResult) {
    if let Some(ref directory) = config.output.directory {
        if directory.trim().is_empty() {
            result.add_error(ValidationError::with_path(
                ErrorCode::EmptyOutputDirectory,
                "output directory must not be empty (omit it to use the default)",
                "output.directory",
            ));
        }
    }
}
