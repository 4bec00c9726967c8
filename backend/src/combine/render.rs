//! Renderer
//!
//! Reads every candidate file and concatenates them into one labeled text
//! document.

use crate::combine::filter::CandidateFiles;
use crate::error::AppError;
use futures_util::future::try_join_all;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::time::timeout;

/// Render one block of the combined document
pub fn render_block(relative_path: &str, content: &str) -> String {
    format!("file name: {}\n---\n{}\n", relative_path, content)
}

/// Read all candidates and join their blocks with a blank line
///
/// Reads run concurrently; block order follows the candidate mapping. Any
/// unreadable file fails the whole document.
pub async fn render_document(
    candidates: &CandidateFiles,
    read_timeout: Duration,
) -> Result<String, AppError> {
    let blocks = try_join_all(candidates.iter().map(|(relative_path, storage_path)| async move {
        let content = read_candidate(relative_path, storage_path, read_timeout).await?;
        Ok::<_, AppError>(render_block(relative_path, &content))
    }))
    .await?;

    tracing::debug!(blocks = blocks.len(), "Rendered combined document");
    Ok(blocks.join("\n"))
}

/// Read one file as text, replacing invalid UTF-8
async fn read_candidate(
    relative_path: &str,
    storage_path: &Path,
    read_timeout: Duration,
) -> Result<String, AppError> {
    let bytes = match timeout(read_timeout, fs::read(storage_path)).await {
        Ok(result) => result,
        Err(_) => Err(std::io::Error::new(
            ErrorKind::TimedOut,
            format!("read timed out after {:?}", read_timeout),
        )),
    }
    .map_err(|source| AppError::ReadError {
        path: relative_path.to_string(),
        source,
    })?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
