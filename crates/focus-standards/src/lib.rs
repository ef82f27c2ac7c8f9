#![deny(unsafe_code)]

pub mod error;
pub mod lint;
pub mod mapping_loader;
pub mod paths;
pub mod spec_loader;
pub mod version;

pub use crate::error::{Result, StandardsError};
pub use crate::lint::{MappingLint, validate_mapping};
pub use crate::mapping_loader::{load_mapping_config, parse_mapping_config};
pub use crate::paths::{SPEC_DIR_ENV_VAR, bundled_spec_dir, spec_search_paths};
pub use crate::spec_loader::{list_available_spec_versions, load_focus_spec, load_focus_spec_from_path};
pub use crate::version::{compare_versions, normalize_version, versions_match};
