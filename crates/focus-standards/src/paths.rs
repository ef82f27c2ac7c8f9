//! Spec directory resolution.

use std::path::{Path, PathBuf};

/// Environment variable for overriding the spec directory.
pub const SPEC_DIR_ENV_VAR: &str = "FOCUS_SPEC_DIR";

/// Bundled spec documents shipped with the workspace.
pub fn bundled_spec_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../standards")
}

/// Directories searched for spec documents, highest priority first.
///
/// Resolution order:
/// 1. an explicit directory
/// 2. `FOCUS_SPEC_DIR`
/// 3. the bundled `standards/` directory
pub fn spec_search_paths(spec_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = spec_dir {
        paths.push(dir.to_path_buf());
    }
    if let Ok(dir) = std::env::var(SPEC_DIR_ENV_VAR)
        && !dir.is_empty()
    {
        paths.push(PathBuf::from(dir));
    }
    paths.push(bundled_spec_dir());
    paths
}

/// File name of the document for a normalized version, e.g. `focus_spec_v1.2.json`.
pub fn spec_file_name(normalized_version: &str) -> String {
    format!("focus_spec_v{normalized_version}.json")
}
