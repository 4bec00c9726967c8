//! Combine API handler
//!
//! `POST /combine` accepts a multipart form with file parts and JSON-encoded
//! filter fields, and answers with the combined document as a download.

use crate::combine::{self, CombineRequest, FormFields, UploadBatch};
use crate::config::Config;
use crate::error::AppError;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Response,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Combine uploaded files into one labeled text document
///
/// Accepts multipart form data with:
/// - files: one or more file parts (any part carrying a filename)
/// - filePaths: JSON array of relative paths, one per file part, same order
/// - excludeFiles / ignoreFolders / ignoreExtensions: optional JSON arrays
/// - outputFile: optional name of the downloaded document
pub async fn combine_files(
    State(config): State<Arc<Config>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let multipart = multipart.map_err(|e| AppError::MalformedInput(e.body_text()))?;

    // Uploads are removed when `uploads` drops, on every path out of here
    let (fields, uploads) = receive_form(multipart, &config.combine.temp_root).await?;

    let request = CombineRequest::from_fields(
        fields,
        uploads.len(),
        &config.combine.default_output_file,
    )?;

    let artifact = combine::combine(&request, &uploads, &config.combine).await?;
    artifact.into_download(uploads).await
}

/// Read every multipart field, storing file parts under `temp_root`
///
/// # Returns
/// * `Ok((FormFields, UploadBatch))` - Text fields and stored uploads
/// * `Err(AppError)` - If the multipart stream is malformed or a file cannot be stored
pub async fn receive_form(
    mut multipart: Multipart,
    temp_root: &Path,
) -> Result<(FormFields, UploadBatch), AppError> {
    let mut fields = FormFields::default();
    let mut uploads = UploadBatch::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::MalformedInput(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        if let Some(file_name) = field.file_name().map(|s| s.to_string()) {
            uploads.save(temp_root, &file_name, field).await?;
            continue;
        }

        let text = field.text().await.map_err(|e| {
            AppError::MalformedInput(format!("Failed to read {} field: {}", field_name, e))
        })?;
        if !fields.set(&field_name, text) {
            warn!("Unknown multipart field: {}", field_name);
        }
    }

    info!("Number of files: {}", uploads.len());
    Ok((fields, uploads))
}
