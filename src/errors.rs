//! # Error Types
//!
//! Error handling for the instrumentation engine and its MCP surface.
//! Structural mismatches are recoverable per class or per call site; host mutation
//! failures abort the current file and are folded into [`ServiceError::Faults`].

use crate::types::{FileFault, InstrumentationResult};
use rmcp::model::ErrorData;
use std::fmt;
use std::path::PathBuf;

/// Error types that can occur while loading, instrumenting or serving a corpus.
#[derive(Debug)]
pub enum ServiceError {
    /// An expected node shape is absent (missing body, missing argument list, ...)
    StructuralMismatch(String),
    /// The edit transaction rejected a batch of edits
    HostMutation(String),
    /// A synthesized fragment did not parse in its dialect context
    Template(String),
    /// Invalid configuration value
    Config(String),
    /// Internal service error with custom message
    Internal(String),
    /// I/O error reading/writing files
    Io(std::io::Error),
    /// Error walking directory trees during corpus enumeration
    WalkDir(walkdir::Error),
    /// Error parsing YAML configuration
    SerdeYaml(serde_yaml::Error),
    /// Error parsing JSON data
    SerdeJson(serde_json::Error),
    /// Regular expression compilation error
    Regex(regex::Error),
    /// Glob pattern compilation error
    Glob(globset::Error),
    /// Requested file not found
    FileNotFound(PathBuf),
    /// One or more files failed; carries the result accumulated so far
    Faults {
        faults: Vec<FileFault>,
        partial: Box<InstrumentationResult>,
    },
}

impl ServiceError {
    /// Whether the error only invalidates the smallest enclosing unit (class or call site).
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ServiceError::StructuralMismatch(_) | ServiceError::Template(_)
        )
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::StructuralMismatch(msg) => write!(f, "Structural mismatch: {msg}"),
            ServiceError::HostMutation(msg) => write!(f, "Edit transaction failed: {msg}"),
            ServiceError::Template(msg) => write!(f, "Template error: {msg}"),
            ServiceError::Config(msg) => write!(f, "Configuration error: {msg}"),
            ServiceError::Internal(msg) => write!(f, "Internal error: {msg}"),
            ServiceError::Io(err) => write!(f, "IO error: {err}"),
            ServiceError::WalkDir(err) => write!(f, "Directory traversal error: {err}"),
            ServiceError::SerdeYaml(err) => write!(f, "YAML parsing error: {err}"),
            ServiceError::SerdeJson(err) => write!(f, "JSON parsing error: {err}"),
            ServiceError::Regex(err) => write!(f, "Regex error: {err}"),
            ServiceError::Glob(err) => write!(f, "Glob error: {err}"),
            ServiceError::FileNotFound(path) => write!(f, "File not found: {}", path.display()),
            ServiceError::Faults { faults, .. } => {
                write!(f, "Instrumentation failed in {} file(s)", faults.len())?;
                for fault in faults {
                    write!(f, "\n  {}: {}", fault.file_path, fault.message)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Io(err)
    }
}

impl From<walkdir::Error> for ServiceError {
    fn from(err: walkdir::Error) -> Self {
        ServiceError::WalkDir(err)
    }
}

impl From<serde_yaml::Error> for ServiceError {
    fn from(err: serde_yaml::Error) -> Self {
        ServiceError::SerdeYaml(err)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerdeJson(err)
    }
}

impl From<regex::Error> for ServiceError {
    fn from(err: regex::Error) -> Self {
        ServiceError::Regex(err)
    }
}

impl From<globset::Error> for ServiceError {
    fn from(err: globset::Error) -> Self {
        ServiceError::Glob(err)
    }
}

impl From<ServiceError> for ErrorData {
    fn from(err: ServiceError) -> Self {
        let data = match &err {
            ServiceError::Faults { partial, .. } => serde_json::to_value(partial.as_ref()).ok(),
            _ => None,
        };
        ErrorData::internal_error(err.to_string(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_errors() {
        assert!(ServiceError::StructuralMismatch("no body".into()).is_structural());
        assert!(ServiceError::Template("bad".into()).is_structural());
        assert!(!ServiceError::HostMutation("overlap".into()).is_structural());
    }

    #[test]
    fn test_faults_carry_partial_result() {
        let partial = InstrumentationResult {
            instrumented_count: 3,
            ..Default::default()
        };
        let err = ServiceError::Faults {
            faults: vec![FileFault {
                file_path: "A.java".to_string(),
                message: "boom".to_string(),
            }],
            partial: Box::new(partial),
        };
        assert!(err.to_string().contains("A.java: boom"));
        let data: ErrorData = err.into();
        assert_eq!(data.data.unwrap()["instrumented_count"], 3);
    }
}
