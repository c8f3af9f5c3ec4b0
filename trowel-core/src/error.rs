/// Error types for loading and slicing meshes
use thiserror::Error;

/// Errors raised by the loader, the geometry kernel and the mesh.
#[derive(Error, Debug)]
pub enum Error {
    /// STL content violates the expected grammar or layout.
    #[error("invalid STL: {message}")]
    Format { message: String },

    /// A value of the wrong kind reached a constructor or parser.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Geometry that cannot produce a definite answer (zero-length vector, empty mesh, ...).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    pub(crate) fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometry(message.into())
    }
}

/// Result type for trowel operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::format("truncated record");
        assert_eq!(err.to_string(), "invalid STL: truncated record");

        let err = Error::type_mismatch("float", "abc");
        assert_eq!(err.to_string(), "type mismatch: expected float, found abc");

        let err = Error::degenerate("empty mesh");
        assert!(err.to_string().contains("empty mesh"));
    }
}
