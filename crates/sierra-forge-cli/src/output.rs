//! Terminal rendering of generation and verification results.
//!
//! Status lines carry a colored tag (`[OK]`, `[WARN]`, `[ERROR]`); identity
//! references and tokens are printed as aligned `key: value` rows.

use std::path::Path;

use console::style;

use sierra_forge_core::finalizer::{IdentityReference, IdentityReport, IdentityRole};
use sierra_forge_core::toolchain::{PrerequisiteError, VersionWarning};

/// Width of the key column in `key: value` rows.
const KEY_WIDTH: usize = 18;

/// `sierra-forge <command>: <subject>` underlined.
pub fn print_header(command: &str, subject: &str) {
    let text = format!("sierra-forge {command}: {subject}");
    println!("\n{}", style(&text).bold().cyan());
    println!("{}", style("=".repeat(text.chars().count())).dim());
}

pub fn print_success(text: &str) {
    println!("{} {}", style("[OK]").green().bold(), text);
}

pub fn print_warning(text: &str) {
    println!("{} {}", style("[WARN]").yellow().bold(), text);
}

pub fn print_error(text: &str) {
    eprintln!("{} {}", style("[ERROR]").red().bold(), text);
}

/// `[2/4] Rendering and assembling project`
pub fn print_step(step: u32, total: u32, text: &str) {
    println!("{} {}", style(format!("[{step}/{total}]")).dim(), text);
}

pub fn print_key_value(key: &str, value: &str) {
    println!("  {:<KEY_WIDTH$} {}", style(format!("{key}:")).dim(), value);
}

/// One identity reference as `path:line role = value`.
pub fn print_reference(reference: &IdentityReference) {
    println!("  {}", format_reference(reference));
}

fn format_reference(reference: &IdentityReference) -> String {
    format!(
        "{} {} = {}",
        style(format!("{}:{}", reference.path.display(), reference.line)).dim(),
        style(reference.role).cyan(),
        reference.value
    )
}

/// Reference count per identity role.
pub fn print_identity_counts(report: &IdentityReport) {
    for role in [
        IdentityRole::Namespace,
        IdentityRole::ApplicationId,
        IdentityRole::LibraryName,
        IdentityRole::NativeTarget,
    ] {
        print_key_value(&role.to_string(), &report.count(role).to_string());
    }
}

/// A vocabulary token, its value, and what it stands for.
pub fn print_token(token: &str, value: &str, description: &str) {
    print_key_value(token, value);
    println!("  {:<KEY_WIDTH$} {}", "", style(description).dim());
}

pub fn print_missing_tool(missing: &PrerequisiteError) {
    print_warning(&format!(
        "{} not found (install: {})",
        missing.tool_name, missing.install_instructions
    ));
}

pub fn print_version_warning(warning: &VersionWarning) {
    print_warning(&format!(
        "{}: found v{}, minimum v{} recommended",
        warning.tool_name, warning.found_version, warning.minimum_version
    ));
}

/// How to build the project that was just generated.
pub fn print_next_steps(output_root: &Path) {
    println!();
    println!("  Next steps:");
    println!("    cd {}", output_root.display());
    println!("    gradle assembleDebug");
    println!();
}
