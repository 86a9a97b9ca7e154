//! Model targets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A single model file to operate on
///
/// Identity is the path: two targets with the same name but different
/// paths are different models.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelTarget {
    /// Display name (e.g., "stg_users" or "users.sql")
    pub name: String,

    /// Absolute path to the SQL file
    pub path: PathBuf,
}

impl ModelTarget {
    /// Create a new target
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Path of the model file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to `root`, or the full path if it lies outside `root`
    pub fn relative_to(&self, root: &Path) -> PathBuf {
        self.path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.path.clone())
    }
}

impl fmt::Display for ModelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_inside_root() {
        let target = ModelTarget::new("users", "/project/models/users.sql");
        assert_eq!(
            target.relative_to(Path::new("/project")),
            PathBuf::from("models/users.sql")
        );
    }

    #[test]
    fn relative_path_outside_root() {
        let target = ModelTarget::new("users", "/elsewhere/users.sql");
        assert_eq!(
            target.relative_to(Path::new("/project")),
            PathBuf::from("/elsewhere/users.sql")
        );
    }
}
