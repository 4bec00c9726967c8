//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// Every failure of a combine request ends up here. The client always sees
/// a 500 with a uniform `{ "error": ... }` body.
#[derive(Error, Debug)]
pub enum AppError {
    /// A form field could not be parsed (bad JSON, unreadable multipart stream)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Number of uploaded files differs from number of declared paths
    #[error("Mismatch: {files} files but {paths} paths")]
    CountMismatch {
        /// Received file parts
        files: usize,
        /// Declared relative paths
        paths: usize,
    },

    /// A candidate file could not be read
    #[error("Failed to read {path}: {source}")]
    ReadError {
        /// Relative path of the file that failed
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Persisting an upload or the combined document failed
    #[error("Write error: {0}")]
    WriteError(String),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = self.to_string();
        tracing::error!(status = status.as_u16(), "Error: {}", error_message);

        let body = Json(json!({ "error": error_message }));

        (status, body).into_response()
    }
}
