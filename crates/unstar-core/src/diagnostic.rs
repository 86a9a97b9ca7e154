//! Diagnostic codes and per-model reporting
//!
//! Codes are stable strings: reporters and CI annotations print them.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// The model file listed for a target does not exist
    ModelFileMissing,

    /// Failed to read a model file
    ModelReadFailed,

    /// Failed to write a rewritten model (or its backup)
    ModelWriteFailed,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModelFileMissing => "MODEL_FILE_MISSING",
            Self::ModelReadFailed => "MODEL_READ_FAILED",
            Self::ModelWriteFailed => "MODEL_WRITE_FAILED",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Source location in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: String,
}

impl Location {
    /// Create a new location with just a file path
    pub fn new(file: impl Into<String>) -> Self {
        Self { file: file.into() }
    }
}

/// A per-model failure: the model was not processed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Human-readable message
    pub message: String,

    /// Model name the diagnostic is about
    pub model: Option<String>,

    /// Source location (best-effort)
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            model: None,
            location: None,
        }
    }

    /// Set the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        assert_eq!(DiagnosticCode::ModelFileMissing.as_str(), "MODEL_FILE_MISSING");
        assert_eq!(DiagnosticCode::ModelWriteFailed.as_str(), "MODEL_WRITE_FAILED");
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::new(DiagnosticCode::ModelReadFailed, "permission denied")
            .with_model("users")
            .with_location(Location::new("models/users.sql"));

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("MODEL_READ_FAILED"));
        assert!(json.contains("permission denied"));
        assert!(json.contains("models/users.sql"));
    }
}
