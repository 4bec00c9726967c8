//! Path resolver
//!
//! Pairs each received file with the relative path the client declared for
//! it. Pairing is by upload position, so uploads sharing an original name
//! (every `index.js` in a project) keep their own paths.

use crate::combine::upload::UploadedFile;
use std::path::PathBuf;
use tracing::debug;

/// An upload paired with its declared relative path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Client-declared relative path, including folder segments
    pub relative_path: String,
    /// Where the upload is stored
    pub storage_path: PathBuf,
}

/// Pair uploads with declared paths by position
///
/// Falls back to the original name when no path exists for an upload.
pub fn resolve_paths(files: &[UploadedFile], paths: &[String]) -> Vec<ResolvedFile> {
    files
        .iter()
        .enumerate()
        .map(|(index, file)| {
            let relative_path = paths
                .get(index)
                .filter(|p| !p.is_empty())
                .cloned()
                .unwrap_or_else(|| file.original_name.clone());
            debug!(
                original_name = %file.original_name,
                relative_path = %relative_path,
                "Mapped upload to relative path"
            );
            ResolvedFile {
                relative_path,
                storage_path: file.storage_path.clone(),
            }
        })
        .collect()
}
