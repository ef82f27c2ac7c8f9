use std::collections::BTreeSet;
use std::path::Path;

use focus_model::FocusSpec;
use tracing::debug;

use crate::error::{Result, StandardsError};
use crate::paths::{spec_file_name, spec_search_paths};
use crate::version::{compare_versions, normalize_version};

const SPEC_FILE_PREFIX: &str = "focus_spec_v";
const SPEC_FILE_SUFFIX: &str = ".json";

/// Load the spec document for `version`.
///
/// The first search directory holding `focus_spec_v{version}.json` wins.
/// Unknown data types or feature levels fail the load.
pub fn load_focus_spec(version: &str, spec_dir: Option<&Path>) -> Result<FocusSpec> {
    let normalized = normalize_version(version);
    let file_name = spec_file_name(&normalized);
    let search = spec_search_paths(spec_dir);
    for dir in &search {
        let path = dir.join(&file_name);
        if path.is_file() {
            debug!(path = %path.display(), "loading spec document");
            return load_focus_spec_from_path(&path);
        }
    }
    Err(StandardsError::SpecNotFound {
        version: version.to_string(),
        searched: search
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

pub fn load_focus_spec_from_path(path: &Path) -> Result<FocusSpec> {
    let text = std::fs::read_to_string(path).map_err(|e| StandardsError::io(path, e))?;
    serde_json::from_str(&text).map_err(|source| StandardsError::SpecJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Versions available across all search directories, as `v{version}`, ascending.
pub fn list_available_spec_versions(spec_dir: Option<&Path>) -> Result<Vec<String>> {
    let mut versions = BTreeSet::new();
    for dir in spec_search_paths(spec_dir) {
        if !dir.is_dir() {
            continue;
        }
        let entries = std::fs::read_dir(&dir).map_err(|e| StandardsError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StandardsError::io(&dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = path.file_name().and_then(|v| v.to_str()).unwrap_or("");
            if let Some(raw) = name
                .strip_prefix(SPEC_FILE_PREFIX)
                .and_then(|rest| rest.strip_suffix(SPEC_FILE_SUFFIX))
                && !raw.is_empty()
            {
                versions.insert(normalize_version(raw));
            }
        }
    }
    let mut versions: Vec<String> = versions.into_iter().collect();
    versions.sort_by(|a, b| compare_versions(a, b));
    Ok(versions.into_iter().map(|v| format!("v{v}")).collect())
}
