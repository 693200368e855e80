//! End-to-end project generation.
//!
//! ```text
//! metadata ─▶ resolve ─▶ render (rayon) ─▶ stage ─▶ verify identity ─▶ commit
//! ```
//!
//! Every step before `commit` is side-effect free with respect to the output
//! root: rendering happens in memory, staging happens in a sibling temp
//! directory, and the finalizer reads the staged tree. The first error drops
//! the staging directory and is returned unchanged.

use std::path::PathBuf;

use crate::assembler;
use crate::error::Result;
use crate::finalizer::{self, IdentityReport};
use crate::metadata::ApplicationMetadata;
use crate::report::GenerationReport;
use crate::templates::renderer::TemplateRenderer;
use crate::templates::resolver::{self, TemplateSource};
use crate::tokens::TokenMapping;

/// Everything one generation needs.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub metadata: ApplicationMetadata,
    pub template: TemplateSource,
    pub output_root: PathBuf,
    /// Authorizes replacing a non-empty output root.
    pub overwrite: bool,
}

/// Result of a successful generation.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub output_root: PathBuf,
    pub report: GenerationReport,
    pub identity: IdentityReport,
}

/// Generate a project. Either the whole tree appears at the output root or
/// nothing changes there.
pub fn generate(request: &GenerationRequest) -> Result<GenerationOutcome> {
    let metadata = &request.metadata;
    tracing::info!(
        "generating {} {} from {}",
        metadata.name(),
        metadata.version_name(),
        request.template.describe()
    );

    assembler::check_output_root(&request.output_root, request.overwrite)?;

    let files = resolver::resolve(&request.template)?;
    tracing::info!("resolved {} template files", files.len());

    let tokens = TokenMapping::from_metadata(metadata);
    let rendered = TemplateRenderer::new(&tokens).render_all(&files)?;
    tracing::info!(
        "rendered {} files ({} copied verbatim)",
        rendered.len(),
        rendered.iter().filter(|f| !f.rendered).count()
    );

    let staged = assembler::stage(&rendered, &request.output_root)?;
    let identity = finalizer::verify(staged.root(), metadata)?;
    let output_root = staged.commit(request.overwrite)?;

    Ok(GenerationOutcome {
        output_root,
        report: GenerationReport::new(metadata, &request.template.describe(), &rendered),
        identity,
    })
}
