use thiserror::Error;

/// Result type for probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Errors that can occur while querying a document
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Document could not be read from disk
    #[error("Failed to load '{path}': {source}")]
    Load {
        path: String,
        source: std::io::Error,
    },

    /// Document content is not well-formed JSON
    #[error("'{path}' is not well-formed JSON: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    /// A user-supplied expression or pattern failed to compile or evaluate
    #[error("Expression error: {0}")]
    Expression(String),

    /// The resolved target does not have the shape the operation requires
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl ProbeError {
    /// Wrap an I/O failure with the document path
    pub fn load(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Load {
            path: path.into(),
            source,
        }
    }

    /// Wrap a JSON syntax failure with the document path
    pub fn parse(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Create an expression error
    pub fn expression(msg: impl Into<String>) -> Self {
        Self::Expression(msg.into())
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }
}
