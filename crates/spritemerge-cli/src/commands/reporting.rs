//! Console output shared by the commands.

use colored::Colorize;
use spritemerge_spec::{ValidationError, ValidationWarning};

fn path_info(path: &Option<String>) -> String {
    path.as_ref()
        .map(|p| format!(" at {}", p))
        .unwrap_or_default()
}

/// Print validation errors to the console
pub(crate) fn print_validation_errors(errors: &[ValidationError]) {
    if errors.is_empty() {
        return;
    }
    println!("\n{}", "Errors:".red().bold());
    for error in errors {
        println!(
            "  {} [{}]{}: {}",
            "x".red(),
            error.code.to_string().red(),
            path_info(&error.path).dimmed(),
            error.message
        );
    }
}

/// Print validation warnings to the console
pub(crate) fn print_validation_warnings(warnings: &[ValidationWarning]) {
    if warnings.is_empty() {
        return;
    }
    println!("\n{}", "Warnings:".yellow().bold());
    for warning in warnings {
        println!(
            "  {} [{}]{}: {}",
            "!".yellow(),
            warning.code.to_string().yellow(),
            path_info(&warning.path).dimmed(),
            warning.message
        );
    }
}
