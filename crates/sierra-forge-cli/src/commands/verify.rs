use std::path::Path;

use anyhow::Result;

use sierra_forge_core::config::DEFAULT_VERSION_NAME;
use sierra_forge_core::error::ForgeError;
use sierra_forge_core::finalizer;
use sierra_forge_core::metadata::ApplicationMetadata;

use crate::output;

/// Check an existing project's identity references against `name`.
///
/// Read-only: reports every namespace, application id and library reference
/// found, or the first one that diverges.
pub async fn run(dir: &Path, name: &str) -> Result<()> {
    output::print_header("verify", &dir.display().to_string());

    // the version does not take part in identity checks
    let metadata = ApplicationMetadata::new(name, DEFAULT_VERSION_NAME)?;
    output::print_key_value("Expected package", metadata.package());
    output::print_key_value("Expected library", metadata.name());

    let report = match finalizer::verify(dir, &metadata) {
        Ok(report) => report,
        Err(e @ (ForgeError::IdentityMismatch { .. } | ForgeError::IdentityMissing { .. })) => {
            output::print_error(&e.to_string());
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    report.references.iter().for_each(output::print_reference);
    output::print_success(&format!(
        "{} identity references agree with '{}'",
        report.references.len(),
        metadata.name()
    ));

    Ok(())
}
