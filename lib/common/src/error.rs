/// An error that aborts the compilation of a query.
///
/// Outcomes that are part of normal compilation, such as a pattern without
/// any candidate relation or a filter that cannot be expressed in SQL, are
/// not errors. They are represented by empty results and by
/// non-convertible expressions respectively.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CompilationError {
    /// A table alias is malformed or qualified where it must not be.
    #[error("Invalid alias: {0}")]
    InvalidAlias(String),
    /// A join condition could not be parsed.
    #[error("Invalid join condition: {0}")]
    InvalidJoin(String),
    /// An SQL identifier could not be parsed.
    #[error("Invalid identifier \"{identifier}\": {reason}")]
    InvalidIdentifier { identifier: String, reason: String },
    /// An inner join was given a child that has no table name.
    #[error("Inner join children must be named: {0}")]
    NonNamedJoinChild(String),
    /// A relation refers to a table that is not part of the database.
    #[error("Unknown table: {0}")]
    UnknownTable(String),
    /// The filter push-down lost track of a filter expression.
    #[error("Filter push-down is unbalanced: {0}")]
    UnbalancedPushDown(String),
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    #[error("An internal error occurred: {0}")]
    InternalError(String),
}

impl CompilationError {
    /// Returns an [`CompilationError::InternalError`] wrapped in an `Err`.
    pub fn internal<T>(cause: String) -> Result<T, Self> {
        Err(Self::InternalError(cause))
    }

    pub fn invalid_identifier(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }
}

/// The result type of every fallible compiler operation.
pub type CompileResult<T> = Result<T, CompilationError>;
