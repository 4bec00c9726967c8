//! Received uploads
//!
//! Each file part of a combine request is streamed to its own uniquely named
//! file under the temp root. The batch owns those files and removes them when
//! it is dropped, so every exit path of a request cleans up after itself.

use crate::error::AppError;
use axum::body::Bytes;
use futures_util::{Stream, StreamExt};
use std::fmt::Display;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Prefix for stored upload files under the temp root
pub const UPLOAD_FILE_PREFIX: &str = "combine-upload-";

/// A single file received from the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// File name as sent by the client (no folder segments)
    pub original_name: String,
    /// Where the bytes were stored on the server
    pub storage_path: PathBuf,
    /// Number of bytes received
    pub size_bytes: u64,
}

/// All files received for one request, in upload order
#[derive(Debug, Default)]
pub struct UploadBatch {
    files: Vec<UploadedFile>,
}

impl UploadBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Received files in upload order
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Number of received files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file has been received
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Stream an uploaded file to a fresh location under `root`
    ///
    /// The file is registered with the batch before any byte is written, so a
    /// partially written upload is still removed on drop.
    ///
    /// # Arguments
    /// * `root` - Directory receiving the stored file
    /// * `original_name` - Client-side file name
    /// * `chunks` - Body of the file part
    ///
    /// # Returns
    /// * `Ok(&UploadedFile)` - The stored file
    /// * `Err(AppError)` - If the part could not be read or written
    pub async fn save<S, E>(
        &mut self,
        root: &Path,
        original_name: &str,
        chunks: S,
    ) -> Result<&UploadedFile, AppError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let mut chunks = std::pin::pin!(chunks);

        let storage_path = root.join(format!("{}{}", UPLOAD_FILE_PREFIX, Uuid::new_v4()));
        let index = self.files.len();
        self.files.push(UploadedFile {
            original_name: original_name.to_string(),
            storage_path: storage_path.clone(),
            size_bytes: 0,
        });

        let mut file = fs::File::create(&storage_path).await.map_err(|e| {
            AppError::WriteError(format!(
                "Failed to store upload {}: {}",
                original_name, e
            ))
        })?;

        let mut size_bytes = 0u64;
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| {
                AppError::MalformedInput(format!(
                    "Failed to read upload {}: {}",
                    original_name, e
                ))
            })?;
            file.write_all(&chunk).await.map_err(|e| {
                AppError::WriteError(format!(
                    "Failed to store upload {}: {}",
                    original_name, e
                ))
            })?;
            size_bytes += chunk.len() as u64;
        }

        file.sync_all().await.map_err(|e| {
            AppError::WriteError(format!("Failed to sync upload {}: {}", original_name, e))
        })?;

        self.files[index].size_bytes = size_bytes;
        info!(
            original_name = %original_name,
            size_bytes,
            "Saved uploaded file"
        );

        Ok(&self.files[index])
    }
}

impl Drop for UploadBatch {
    fn drop(&mut self) {
        let paths: Vec<PathBuf> = self
            .files
            .drain(..)
            .map(|file| file.storage_path)
            .collect();
        if paths.is_empty() {
            return;
        }

        // Keep blocking deletes off the async workers when a runtime is around
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_uploads(&paths));
            }
            Err(_) => remove_uploads(&paths),
        }
    }
}

/// Delete stored uploads; one failure never stops the rest
fn remove_uploads(paths: &[PathBuf]) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "Removed upload"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to cleanup upload {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::testing::assert_dir_empties;
    use futures_util::stream;
    use tempfile::tempdir;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::copy_from_slice(p.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn test_save_streams_all_chunks() {
        let root = tempdir().expect("Failed to create temp dir");
        let mut batch = UploadBatch::new();

        let stored = batch
            .save(root.path(), "a.txt", chunks(&["hello ", "world"]))
            .await
            .expect("Failed to save upload")
            .clone();

        assert_eq!(stored.original_name, "a.txt");
        assert_eq!(stored.size_bytes, 11);
        assert!(stored.storage_path.starts_with(root.path()));
        assert_eq!(
            std::fs::read_to_string(&stored.storage_path).unwrap(),
            "hello world"
        );
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn test_same_name_gets_distinct_storage() {
        let root = tempdir().expect("Failed to create temp dir");
        let mut batch = UploadBatch::new();

        batch
            .save(root.path(), "index.js", chunks(&["one"]))
            .await
            .unwrap();
        batch
            .save(root.path(), "index.js", chunks(&["two"]))
            .await
            .unwrap();

        let files = batch.files();
        assert_ne!(files[0].storage_path, files[1].storage_path);
    }

    #[tokio::test]
    async fn test_drop_removes_every_file() {
        let root = tempdir().expect("Failed to create temp dir");
        let mut batch = UploadBatch::new();
        batch.save(root.path(), "a", chunks(&["a"])).await.unwrap();
        batch.save(root.path(), "b", chunks(&["b"])).await.unwrap();

        // One file already gone must not stop the others from being removed
        std::fs::remove_file(&batch.files()[0].storage_path).unwrap();
        let remaining = batch.files()[1].storage_path.clone();

        drop(batch);
        assert_dir_empties(root.path()).await;
        assert!(!remaining.exists());
    }

    #[test]
    fn test_drop_without_runtime_removes_inline() {
        let root = tempdir().expect("Failed to create temp dir");
        let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
        let batch = runtime.block_on(async {
            let mut batch = UploadBatch::new();
            batch.save(root.path(), "a", chunks(&["a"])).await.unwrap();
            batch
        });
        drop(runtime);

        let stored = batch.files()[0].storage_path.clone();
        assert!(stored.exists());
        drop(batch);
        assert!(!stored.exists());
    }

    #[tokio::test]
    async fn test_failed_stream_still_cleaned_up() {
        let root = tempdir().expect("Failed to create temp dir");
        let mut batch = UploadBatch::new();

        let broken = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(ErrorKind::ConnectionReset, "client went away")),
        ]);
        let result = batch.save(root.path(), "big.bin", broken).await;
        assert!(matches!(result, Err(AppError::MalformedInput(_))));
        assert_eq!(batch.len(), 1);

        drop(batch);
        assert_dir_empties(root.path()).await;
    }

    #[tokio::test]
    async fn test_missing_root_is_write_error() {
        let mut batch = UploadBatch::new();
        let result = batch
            .save(Path::new("/nonexistent/root/12345"), "a.txt", chunks(&["x"]))
            .await;
        assert!(matches!(result, Err(AppError::WriteError(_))));
    }
}
