//! Error types for unit loading and module resolution

use thiserror::Error;

/// Result type for loading operations
pub type LoadResult<T> = Result<T, LoadError>;

/// Error produced by a unit's loader.
///
/// Cloneable so one shared pending computation can hand the same failure to
/// every consumer awaiting it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The loader reported a failure
    #[error("load failed: {message}")]
    Failed { message: String },
}

impl LoadError {
    /// Create a load failure from any displayable cause
    pub fn failed(message: impl Into<String>) -> Self {
        LoadError::Failed {
            message: message.into(),
        }
    }
}

/// Error produced by synchronous module resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No module registered under the given source path
    #[error("module not found: {path}")]
    PathNotFound { path: String },

    /// No module registered under the given weak id
    #[error("module not found: id {id}")]
    IdNotFound { id: i64 },

    /// The module table could not be read
    #[error("module table unavailable: {message}")]
    TableUnavailable { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_display() {
        let err = LoadError::failed("chunk fetch aborted");
        assert_eq!(err.to_string(), "load failed: chunk fetch aborted");
    }

    #[test]
    fn load_error_clones_equal() {
        let err = LoadError::failed("network");
        assert_eq!(err.clone(), err);
    }

    #[test]
    fn resolve_error_display() {
        let err = ResolveError::PathNotFound {
            path: String::from("./routes/About"),
        };
        assert_eq!(err.to_string(), "module not found: ./routes/About");

        let err = ResolveError::IdNotFound { id: 42 };
        assert_eq!(err.to_string(), "module not found: id 42");
    }
}
