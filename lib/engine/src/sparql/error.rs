use rdb2rdf_model::Expression;

/// A filter expression that cannot be evaluated by the database.
///
/// This is not a failure of the compilation. The filter is kept as a SPARQL filter and is
/// evaluated on the solutions instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot translate {expression} to SQL: {reason}")]
pub struct NotConvertible {
    expression: String,
    reason: String,
}

impl NotConvertible {
    pub fn new(expression: &Expression, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns an `Err` with a [`NotConvertible`] for `expression`.
    pub fn err<T>(expression: &Expression, reason: impl Into<String>) -> Result<T, Self> {
        Err(Self::new(expression, reason))
    }

    /// The SPARQL expression that could not be translated.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Why the expression could not be translated.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}
