//! Combine pipeline
//!
//! Turns a batch of uploads plus a validated request into a single labeled
//! text document:
//! resolve paths → filter → read and render → write to a fresh temp directory.
//! Delivery and cleanup are handled by [`artifact::CombinedArtifact`].

pub mod artifact;
pub mod filter;
pub mod render;
pub mod request;
pub mod resolve;
pub mod upload;

pub use artifact::CombinedArtifact;
pub use filter::{CandidateFiles, FilterConfig};
pub use request::{CombineRequest, FormFields};
pub use upload::{UploadBatch, UploadedFile};

use crate::config::CombineConfig;
use crate::error::AppError;
use tracing::info;

/// Run the pipeline for one request and write the combined document
///
/// # Arguments
/// * `request` - Validated request
/// * `uploads` - Files received for the request
/// * `config` - Pipeline configuration
///
/// # Returns
/// * `Ok(CombinedArtifact)` - Document on disk, ready for delivery
/// * `Err(AppError)` - If any file could not be read or the document written
pub async fn combine(
    request: &CombineRequest,
    uploads: &UploadBatch,
    config: &CombineConfig,
) -> Result<CombinedArtifact, AppError> {
    let resolved = resolve::resolve_paths(uploads.files(), &request.file_paths);
    let candidates = filter::filter_files(&resolved, &request.filters);
    let document = render::render_document(&candidates, config.read_timeout()).await?;
    let artifact =
        artifact::write_document(&config.temp_root, &request.output_file_name, &document).await?;

    info!(
        output_file = %artifact.file_name(),
        files = candidates.len(),
        bytes = artifact.len(),
        "Combined document written"
    );
    Ok(artifact)
}
