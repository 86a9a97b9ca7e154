//! Model selection by name or by directory
//!
//! Pure filters over loaded artifacts; they never touch the filesystem.

use crate::artifacts::{normalize, DbtArtifacts, DbtModel};
use std::path::Path;

/// Models whose names appear in `names`, in the order the names are given
///
/// Unknown names are ignored.
pub fn find_models_by_names<'a, S: AsRef<str>>(
    artifacts: &'a DbtArtifacts,
    names: &[S],
) -> Vec<&'a DbtModel> {
    names
        .iter()
        .filter_map(|name| artifacts.model(name.as_ref()))
        .collect()
}

/// Models whose file lives under `base_path` (relative to the project root)
pub fn find_models_by_path<'a>(artifacts: &'a DbtArtifacts, base_path: &Path) -> Vec<&'a DbtModel> {
    if base_path.as_os_str().is_empty() {
        return Vec::new();
    }

    let base = normalize(&artifacts.project_dir.join(base_path));

    artifacts
        .models_by_name
        .values()
        .filter(|model| model.path.parent().is_some_and(|dir| dir.starts_with(&base)))
        .collect()
}
