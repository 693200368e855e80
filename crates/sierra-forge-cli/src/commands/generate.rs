use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use console::Term;
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};

use sierra_forge_core::config::{ForgeConfig, CONFIG_FILE};
use sierra_forge_core::generator::{self, GenerationRequest};
use sierra_forge_core::metadata::ApplicationMetadata;
use sierra_forge_core::templates::resolver::TemplateSource;
use sierra_forge_core::toolchain;

use crate::output;

/// Arguments of `sierra-forge generate`; `None` falls back to the config file.
pub struct GenerateArgs {
    pub name: Option<String>,
    pub version_name: Option<String>,
    pub template: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub force: bool,
    pub report: Option<PathBuf>,
    pub skip_toolchain_check: bool,
}

/// Generate a new application project.
///
/// Validates the application identity, renders the template into a staging
/// directory, checks identity consistency, and moves the result into place.
/// If no name is given on the command line or in the config, prompts
/// interactively.
pub async fn run(config_path: Option<&Path>, args: GenerateArgs) -> Result<()> {
    let config = ForgeConfig::load_or_default(
        config_path.unwrap_or(Path::new(CONFIG_FILE)),
        config_path.is_some(),
    )?;
    tracing::debug!("loaded config: {config:?}");

    let interactive = Term::stdout().is_term();
    let name = match args.name.or_else(|| config.name.clone()) {
        Some(name) => name,
        None if interactive => Input::<String>::new()
            .with_prompt("Application name")
            .interact_text()?,
        None => anyhow::bail!("no application name given (pass NAME or set \"name\" in {CONFIG_FILE})"),
    };
    let version_name = args
        .version_name
        .unwrap_or_else(|| config.version_name_or_default().to_string());

    // identity is validated before anything touches the filesystem
    let metadata = ApplicationMetadata::new(name, version_name)?;
    output::print_header("generate", metadata.name());

    let template = match args.template.or(config.template.clone()) {
        Some(dir) => TemplateSource::Directory(dir),
        None => TemplateSource::Embedded,
    };
    let output_root = args
        .output
        .or(config.output.clone())
        .unwrap_or_else(|| PathBuf::from(metadata.name()));

    output::print_step(1, 4, "Resolving application identity");
    output::print_key_value("Name", metadata.name());
    output::print_key_value("Version", metadata.version_name());
    output::print_key_value("Package", metadata.package());
    output::print_key_value("Template", &template.describe());
    output::print_key_value("Output", &output_root.display().to_string());

    let mut overwrite = args.force || config.overwrite;
    if !overwrite && is_occupied(&output_root) && interactive {
        overwrite = Confirm::new()
            .with_prompt(format!(
                "{} is not empty. Replace it?",
                output_root.display()
            ))
            .default(false)
            .interact()?;
    }

    output::print_step(2, 4, "Rendering and assembling project");
    let request = GenerationRequest {
        metadata: metadata.clone(),
        template,
        output_root,
        overwrite,
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.set_message("rendering templates");
    spinner.enable_steady_tick(Duration::from_millis(80));
    let result = tokio::task::spawn_blocking(move || generator::generate(&request)).await;
    spinner.finish_and_clear();
    let outcome = result.context("generation task panicked")??;

    output::print_step(3, 4, "Verified identity references");
    output::print_identity_counts(&outcome.identity);

    if let Some(report_path) = &args.report {
        outcome.report.save(report_path)?;
        output::print_key_value("Report", &report_path.display().to_string());
    }

    output::print_step(4, 4, "Checking build toolchain");
    if args.skip_toolchain_check {
        output::print_key_value("Toolchain", "skipped");
    } else {
        check_toolchain();
    }

    output::print_success(&format!(
        "Project '{}' generated: {} files, {} bytes",
        metadata.name(),
        outcome.report.files.len(),
        outcome.report.total_bytes()
    ));
    output::print_next_steps(&outcome.output_root);

    Ok(())
}

fn is_occupied(path: &Path) -> bool {
    match std::fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => path.exists(),
    }
}

fn check_toolchain() {
    match toolchain::check_prerequisites() {
        Ok(()) => output::print_success("All build tools found"),
        Err(missing) => missing.iter().for_each(output::print_missing_tool),
    }
    toolchain::check_versions()
        .iter()
        .for_each(output::print_version_warning);
}
