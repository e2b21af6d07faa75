use thiserror::Error;

pub type Result<T> = std::result::Result<T, SolveError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("parse error at column {column}: {message}")]
    Parse { message: String, column: usize },
    #[error("classification error: {0}")]
    Classification(String),
    #[error("unsolvable: {0}")]
    Unsolvable(String),
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl SolveError {
    pub fn parse(message: impl Into<String>, column: usize) -> Self {
        SolveError::Parse {
            message: message.into(),
            column,
        }
    }

    pub fn classification(message: impl Into<String>) -> Self {
        SolveError::Classification(message.into())
    }

    pub fn unsolvable(message: impl Into<String>) -> Self {
        SolveError::Unsolvable(message.into())
    }

    /// Builds an invariant violation and records it; these are defects, never user errors.
    pub fn invariant(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(target: "solver", %message, "internal invariant violated");
        SolveError::InternalInvariant(message)
    }

    /// Stable identifier used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            SolveError::Parse { .. } => "parse_error",
            SolveError::Classification(_) => "classification_error",
            SolveError::Unsolvable(_) => "unsolvable_error",
            SolveError::InternalInvariant(_) => "internal_invariant_error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            SolveError::Parse { message, .. } => message.clone(),
            SolveError::Classification(m)
            | SolveError::Unsolvable(m)
            | SolveError::InternalInvariant(m) => m.clone(),
        }
    }
}
