//! Filter engine
//!
//! Decides which uploads make it into the combined document. Decisions use
//! names, folder segments and extensions only; no content is read here.

use crate::combine::resolve::ResolvedFile;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::{debug, info};

/// Folder names that are ignored on every request
pub const ALWAYS_IGNORED_FOLDERS: [&str; 1] = ["node_modules"];

/// Exclusion rules for one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    /// Exact base names to drop (case-sensitive)
    pub exclude_filenames: HashSet<String>,
    /// Lower-cased folder names to drop
    pub ignore_folders: HashSet<String>,
    /// Lower-cased extensions to drop, without leading dot
    pub ignore_extensions: HashSet<String>,
}

impl FilterConfig {
    /// Build rules from client lists, normalizing case and merging the
    /// always-ignored folders
    pub fn new(
        exclude_filenames: Vec<String>,
        ignore_folders: Vec<String>,
        ignore_extensions: Vec<String>,
    ) -> Self {
        let ignore_folders = ALWAYS_IGNORED_FOLDERS
            .iter()
            .map(|f| f.to_string())
            .chain(ignore_folders)
            .map(|f| f.to_lowercase())
            .collect();

        let ignore_extensions = ignore_extensions
            .into_iter()
            .map(|ext| {
                let ext = ext.to_lowercase();
                match ext.strip_prefix('.') {
                    Some(stripped) => stripped.to_string(),
                    None => ext,
                }
            })
            .collect();

        Self {
            exclude_filenames: exclude_filenames.into_iter().collect(),
            ignore_folders,
            ignore_extensions,
        }
    }

    /// Evaluate every rule against a relative path
    pub fn evaluate(&self, relative_path: &str) -> FilterDecision {
        let name = base_name(relative_path);
        let in_ignored_folder = path_segments(relative_path)
            .iter()
            .any(|segment| self.ignore_folders.contains(segment));

        FilterDecision {
            excluded_by_name: self.exclude_filenames.contains(name),
            in_ignored_folder,
            has_ignored_extension: self.ignore_extensions.contains(&extension(name)),
        }
    }
}

/// Outcome of the filter rules for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDecision {
    /// Base name listed in the exclusion list
    pub excluded_by_name: bool,
    /// Some path segment is an ignored folder
    pub in_ignored_folder: bool,
    /// Extension is ignored
    pub has_ignored_extension: bool,
}

impl FilterDecision {
    /// Whether any rule dropped the file
    pub fn is_excluded(&self) -> bool {
        self.excluded_by_name || self.in_ignored_folder || self.has_ignored_extension
    }
}

/// Surviving files keyed by relative path, in first-insertion order
///
/// Inserting an existing path replaces its storage location but keeps its
/// position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFiles {
    entries: Vec<(String, PathBuf)>,
    index: HashMap<String, usize>,
}

impl CandidateFiles {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the storage location for a relative path
    pub fn insert(&mut self, relative_path: String, storage_path: PathBuf) {
        match self.index.get(&relative_path) {
            Some(&position) => self.entries[position].1 = storage_path,
            None => {
                self.index.insert(relative_path.clone(), self.entries.len());
                self.entries.push((relative_path, storage_path));
            }
        }
    }

    /// Iterate `(relative path, storage path)` in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PathBuf)> {
        self.entries.iter().map(|(rel, path)| (rel.as_str(), path))
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing survived
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Apply the rules to every resolved upload
pub fn filter_files(files: &[ResolvedFile], config: &FilterConfig) -> CandidateFiles {
    let mut candidates = CandidateFiles::new();
    let mut skipped = 0usize;

    for file in files {
        let decision = config.evaluate(&file.relative_path);
        if decision.is_excluded() {
            skipped += 1;
            debug!(
                relative_path = %file.relative_path,
                in_ignored_folder = decision.in_ignored_folder,
                has_ignored_extension = decision.has_ignored_extension,
                excluded = decision.excluded_by_name,
                "Skipping file"
            );
        } else {
            debug!(relative_path = %file.relative_path, "Processing file");
            candidates.insert(file.relative_path.clone(), file.storage_path.clone());
        }
    }

    info!(
        kept = candidates.len(),
        skipped,
        "Filtered uploaded files"
    );
    candidates
}

/// Whether `c` separates path segments in a client-declared path
pub fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Final component of a relative path, splitting on `/` and `\`
pub fn base_name(relative_path: &str) -> &str {
    relative_path
        .rsplit(is_separator)
        .next()
        .unwrap_or(relative_path)
}

/// Lower-cased text after the final dot of a base name
///
/// Dot-files such as `.env` have no extension.
pub fn extension(name: &str) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 => name[dot + 1..].to_lowercase(),
        _ => String::new(),
    }
}

/// Lower-cased path segments, splitting on `/` and `\`
pub fn path_segments(relative_path: &str) -> Vec<String> {
    relative_path
        .split(is_separator)
        .map(|segment| segment.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn resolved(paths: &[&str]) -> Vec<ResolvedFile> {
        paths
            .iter()
            .enumerate()
            .map(|(i, p)| ResolvedFile {
                relative_path: p.to_string(),
                storage_path: PathBuf::from(format!("/tmp/upload-{}", i)),
            })
            .collect()
    }

    fn kept(candidates: &CandidateFiles) -> Vec<&str> {
        candidates.iter().map(|(rel, _)| rel).collect()
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(base_name("src/nested/b.txt"), "b.txt");
        assert_eq!(base_name("src\\win\\c.rs"), "c.rs");
        assert_eq!(base_name("plain.md"), "plain.md");

        assert_eq!(extension("photo.PNG"), "png");
        assert_eq!(extension("archive.tar.GZ"), "gz");
        assert_eq!(extension("Makefile"), "");
        assert_eq!(extension(".env"), "");
        assert_eq!(extension("trailing."), "");

        assert_eq!(path_segments("Src\\Build/x.log"), strings(&["src", "build", "x.log"]));
    }

    #[test]
    fn test_config_normalizes_and_merges_builtin() {
        let config = FilterConfig::new(
            strings(&["Secret.txt"]),
            strings(&["Build", "DIST"]),
            strings(&["PNG", ".Log"]),
        );

        assert!(config.exclude_filenames.contains("Secret.txt"));
        assert!(config.ignore_folders.contains("node_modules"));
        assert!(config.ignore_folders.contains("build"));
        assert!(config.ignore_folders.contains("dist"));
        assert!(config.ignore_extensions.contains("png"));
        assert!(config.ignore_extensions.contains("log"));
    }

    #[test]
    fn test_excluded_filename_in_any_folder() {
        let config = FilterConfig::new(strings(&["secret.txt"]), vec![], vec![]);
        let files = resolved(&["secret.txt", "a/secret.txt", "a/b/secret.txt", "a/notsecret.txt"]);

        let candidates = filter_files(&files, &config);
        assert_eq!(kept(&candidates), vec!["a/notsecret.txt"]);
    }

    #[test]
    fn test_excluded_filename_is_case_sensitive() {
        let config = FilterConfig::new(strings(&["secret.txt"]), vec![], vec![]);
        assert!(!config.evaluate("Secret.TXT").is_excluded());
        assert!(config.evaluate("x/secret.txt").excluded_by_name);
    }

    #[test]
    fn test_ignored_folder_is_case_insensitive() {
        let config = FilterConfig::new(vec![], strings(&["BUILD"]), vec![]);
        let decision = config.evaluate("build/output.log");
        assert!(decision.in_ignored_folder);
        assert!(!decision.has_ignored_extension);
        assert!(config.evaluate("Src/Build/x.rs").is_excluded());
        assert!(!config.evaluate("src/builder.rs").is_excluded());
    }

    #[test]
    fn test_ignored_extension_both_sides_insensitive() {
        let config = FilterConfig::new(vec![], vec![], strings(&["png"]));
        assert!(config.evaluate("img/photo.PNG").has_ignored_extension);

        let config = FilterConfig::new(vec![], vec![], strings(&["PNG"]));
        assert!(config.evaluate("photo.png").is_excluded());
        assert!(!config.evaluate("png/readme.md").is_excluded());
    }

    #[test]
    fn test_node_modules_always_ignored() {
        let config = FilterConfig::new(vec![], vec![], vec![]);
        let files = resolved(&["app/node_modules/lib/index.js", "Node_Modules/x.js", "app/index.js"]);

        let candidates = filter_files(&files, &config);
        assert_eq!(kept(&candidates), vec!["app/index.js"]);
    }

    #[test]
    fn test_empty_extension_only_matches_explicit_entry() {
        let config = FilterConfig::new(vec![], vec![], strings(&["txt"]));
        assert!(!config.evaluate("Makefile").is_excluded());

        let config = FilterConfig::new(vec![], vec![], strings(&[""]));
        assert!(config.evaluate("Makefile").is_excluded());
        assert!(!config.evaluate("main.rs").is_excluded());
    }

    #[test]
    fn test_candidates_keep_first_position_on_duplicate_path() {
        let mut candidates = CandidateFiles::new();
        candidates.insert("a.txt".to_string(), PathBuf::from("/tmp/1"));
        candidates.insert("b.txt".to_string(), PathBuf::from("/tmp/2"));
        candidates.insert("a.txt".to_string(), PathBuf::from("/tmp/3"));

        let entries: Vec<_> = candidates.iter().collect();
        assert_eq!(candidates.len(), 2);
        assert_eq!(entries[0], ("a.txt", &PathBuf::from("/tmp/3")));
        assert_eq!(entries[1], ("b.txt", &PathBuf::from("/tmp/2")));
    }
}
