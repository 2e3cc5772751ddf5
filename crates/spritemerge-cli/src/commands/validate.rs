//! Validate command implementation
//!
//! Checks a merge config file without collecting or writing anything.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use spritemerge_spec::{validate_config, ValidationResult};
use std::path::Path;
use std::process::ExitCode;

use super::reporting::{print_validation_errors, print_validation_warnings};
use crate::settings::load_config;

/// One error or warning in a JSON report.
#[derive(Debug, Serialize)]
pub struct IssueReport {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Machine-readable validation report.
#[derive(Debug, Serialize)]
pub struct ValidateReport {
    pub ok: bool,
    pub config: String,
    pub errors: Vec<IssueReport>,
    pub warnings: Vec<IssueReport>,
}

impl ValidateReport {
    pub fn from_result(config: &str, result: &ValidationResult) -> Self {
        Self {
            ok: result.is_ok(),
            config: config.to_string(),
            errors: result
                .errors
                .iter()
                .map(|e| IssueReport {
                    code: e.code.to_string(),
                    message: e.message.clone(),
                    path: e.path.clone(),
                })
                .collect(),
            warnings: result
                .warnings
                .iter()
                .map(|w| IssueReport {
                    code: w.code.to_string(),
                    message: w.message.clone(),
                    path: w.path.clone(),
                })
                .collect(),
        }
    }
}

/// Run the validate command
///
/// # Returns
/// Exit code: 0 if valid, 1 if the config has errors
pub fn run(config_path: &str, json: bool) -> Result<ExitCode> {
    let config = load_config(Path::new(config_path))?;
    let result = validate_config(&config);

    if json {
        let report = ValidateReport::from_result(config_path, &result);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} {}", "Validating:".cyan().bold(), config_path);
        print_validation_errors(&result.errors);
        print_validation_warnings(&result.warnings);
        if result.is_ok() {
            println!("\n{} config is valid", "SUCCESS".green().bold());
        } else {
            println!("\n{} config is invalid", "FAILED".red().bold());
        }
    }

    if result.is_ok() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
