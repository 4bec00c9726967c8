//! Artifact writer and delivery
//!
//! Writes the combined document into a fresh temp directory and streams it
//! back as a download. The response body owns the temp directory and the
//! request's uploads; both are removed once the body finishes or the client
//! goes away.

use crate::combine::upload::UploadBatch;
use crate::error::AppError;
use axum::{
    body::{Body, Bytes},
    http::{header, StatusCode},
    response::Response,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

/// Prefix of the per-request output directory
pub const OUTPUT_DIR_PREFIX: &str = "combine-";

const CHUNK_SIZE: usize = 64 * 1024;

/// The combined document written to disk
#[derive(Debug)]
pub struct CombinedArtifact {
    dir: Option<TempDir>,
    path: PathBuf,
    file_name: String,
    len: u64,
}

impl CombinedArtifact {
    /// Location of the written document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Download file name
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Size of the document in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the document is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Build a download response that streams the document
    ///
    /// The returned body takes ownership of the artifact and the uploads, so
    /// cleanup runs when the transfer completes or is aborted.
    pub async fn into_download(self, uploads: UploadBatch) -> Result<Response, AppError> {
        let file = fs::File::open(&self.path).await.map_err(|e| {
            AppError::WriteError(format!("Failed to open combined document: {}", e))
        })?;

        let content_disposition = content_disposition(&self.file_name);
        let len = self.len;
        let artifacts = RequestArtifacts {
            output: self,
            uploads,
        };

        let stream = async_stream::stream! {
            let _artifacts = artifacts;
            let mut file = file;
            let mut buf = vec![0u8; CHUNK_SIZE];
            loop {
                match file.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => yield Ok::<_, std::io::Error>(Bytes::copy_from_slice(&buf[..n])),
                    Err(e) => {
                        warn!("Failed to stream combined document: {}", e);
                        yield Err(e);
                        break;
                    }
                }
            }
        };

        download_response(&content_disposition, len, Body::from_stream(stream))
    }
}

/// Attachment response around an already prepared body
pub fn download_response(
    content_disposition: &str,
    len: u64,
    body: Body,
) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CONTENT_DISPOSITION, content_disposition)
        .header(header::CONTENT_LENGTH, len)
        .body(body)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build download response: {}", e)))
}

impl Drop for CombinedArtifact {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn_blocking(move || remove_output_dir(dir));
                }
                Err(_) => remove_output_dir(dir),
            }
        }
    }
}

/// Recursively delete the output directory, ignoring absence
fn remove_output_dir(dir: TempDir) {
    let path = dir.path().to_path_buf();
    match dir.close() {
        Ok(()) => debug!(path = %path.display(), "Removed output directory"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to cleanup output directory {}: {}", path.display(), e),
    }
}

/// Everything a request leaves on disk
///
/// Field order is drop order: output directory first, then uploads.
struct RequestArtifacts {
    #[allow(dead_code)] // Held for its Drop
    output: CombinedArtifact,
    #[allow(dead_code)] // Held for its Drop
    uploads: UploadBatch,
}

/// Write the document into a fresh, uniquely named temp directory
///
/// # Arguments
/// * `temp_root` - Parent of the per-request directory
/// * `file_name` - Sanitized output file name
/// * `document` - Rendered document
pub async fn write_document(
    temp_root: &Path,
    file_name: &str,
    document: &str,
) -> Result<CombinedArtifact, AppError> {
    let dir = tempfile::Builder::new()
        .prefix(OUTPUT_DIR_PREFIX)
        .tempdir_in(temp_root)
        .map_err(|e| AppError::WriteError(format!("Failed to create output directory: {}", e)))?;

    let path = dir.path().join(file_name);
    let artifact = CombinedArtifact {
        dir: Some(dir),
        path,
        file_name: file_name.to_string(),
        len: document.len() as u64,
    };

    fs::write(&artifact.path, document).await.map_err(|e| {
        AppError::WriteError(format!("Failed to write {}: {}", file_name, e))
    })?;

    debug!(
        path = %artifact.path.display(),
        bytes = artifact.len,
        "Wrote combined document"
    );
    Ok(artifact)
}

/// `Content-Disposition` value for a download named `file_name`
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}
