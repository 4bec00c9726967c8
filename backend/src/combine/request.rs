//! Request validation
//!
//! Turns the raw text fields of a combine form into a validated
//! [`CombineRequest`]. List fields arrive as JSON-encoded string arrays.

use crate::combine::filter::{is_separator, FilterConfig};
use crate::error::AppError;

/// Form field carrying the declared relative paths
pub const FIELD_FILE_PATHS: &str = "filePaths";
/// Form field carrying exact filenames to drop
pub const FIELD_EXCLUDE_FILES: &str = "excludeFiles";
/// Form field carrying folder names to drop
pub const FIELD_IGNORE_FOLDERS: &str = "ignoreFolders";
/// Form field carrying extensions to drop
pub const FIELD_IGNORE_EXTENSIONS: &str = "ignoreExtensions";
/// Form field carrying the output file name
pub const FIELD_OUTPUT_FILE: &str = "outputFile";

/// Raw text fields of a combine form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    /// `filePaths`
    pub file_paths: Option<String>,
    /// `excludeFiles`
    pub exclude_files: Option<String>,
    /// `ignoreFolders`
    pub ignore_folders: Option<String>,
    /// `ignoreExtensions`
    pub ignore_extensions: Option<String>,
    /// `outputFile`
    pub output_file: Option<String>,
}

impl FormFields {
    /// Record a text field by name
    ///
    /// Returns `false` when the name is not a known field.
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            FIELD_FILE_PATHS => &mut self.file_paths,
            FIELD_EXCLUDE_FILES => &mut self.exclude_files,
            FIELD_IGNORE_FOLDERS => &mut self.ignore_folders,
            FIELD_IGNORE_EXTENSIONS => &mut self.ignore_extensions,
            FIELD_OUTPUT_FILE => &mut self.output_file,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// A validated combine request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineRequest {
    /// Exclusion rules
    pub filters: FilterConfig,
    /// Name of the combined document
    pub output_file_name: String,
    /// Declared relative paths, one per uploaded file
    pub file_paths: Vec<String>,
}

impl CombineRequest {
    /// Validate form fields against the number of received files
    ///
    /// # Arguments
    /// * `fields` - Raw text fields
    /// * `file_count` - Number of received file parts
    /// * `default_output` - Output name used when `outputFile` is absent
    ///
    /// # Returns
    /// * `Ok(CombineRequest)` - Validated request
    /// * `Err(AppError)` - `MalformedInput` for bad JSON, `CountMismatch` when
    ///   file and path counts differ
    pub fn from_fields(
        fields: FormFields,
        file_count: usize,
        default_output: &str,
    ) -> Result<Self, AppError> {
        let exclude_filenames = parse_list(FIELD_EXCLUDE_FILES, fields.exclude_files.as_deref())?;
        let ignore_folders = parse_list(FIELD_IGNORE_FOLDERS, fields.ignore_folders.as_deref())?;
        let ignore_extensions =
            parse_list(FIELD_IGNORE_EXTENSIONS, fields.ignore_extensions.as_deref())?;
        let file_paths = parse_list(FIELD_FILE_PATHS, fields.file_paths.as_deref())?;

        tracing::info!(
            files = file_count,
            paths = file_paths.len(),
            "Validating combine request"
        );

        if file_count != file_paths.len() {
            return Err(AppError::CountMismatch {
                files: file_count,
                paths: file_paths.len(),
            });
        }

        Ok(Self {
            filters: FilterConfig::new(exclude_filenames, ignore_folders, ignore_extensions),
            output_file_name: output_file_name(fields.output_file.as_deref(), default_output),
            file_paths,
        })
    }
}

/// Parse an optional JSON array of strings; absent or blank means empty
pub fn parse_list(field: &str, raw: Option<&str>) -> Result<Vec<String>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json).map_err(|e| {
            AppError::MalformedInput(format!(
                "{} must be a JSON array of strings: {}",
                field, e
            ))
        }),
    }
}

/// Reduce a requested output name to a single safe file name
///
/// Only the final path component is kept so the name cannot leave the
/// request's temp directory.
pub fn output_file_name(raw: Option<&str>, default_output: &str) -> String {
    let name = raw
        .map(str::trim)
        .and_then(|r| r.rsplit(is_separator).next())
        .map(str::trim)
        .unwrap_or("");

    match name {
        "" | "." | ".." => default_output.to_string(),
        _ => name.to_string(),
    }
}
