use rdb2rdf_common::CompilationError;
use rdb2rdf_model::IriParseError;
use spargebra::SparqlSyntaxError;

/// An error raised while compiling a SPARQL query with a
/// [`MappedDatabase`](crate::mapping::MappedDatabase).
#[derive(Debug, thiserror::Error)]
pub enum QueryCompilationError {
    /// The query is not valid SPARQL.
    #[error(transparent)]
    Syntax(#[from] SparqlSyntaxError),
    /// The mappings are broken or an internal invariant was violated.
    #[error(transparent)]
    Compilation(#[from] CompilationError),
}

/// An error raised while configuring a [`MappedDatabase`](crate::mapping::MappedDatabase).
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The IRI of a prefix or the base IRI is invalid.
    #[error("Invalid IRI '{iri}': {error}")]
    InvalidIri {
        /// The IRI itself.
        iri: String,
        /// The parsing error.
        #[source]
        error: IriParseError,
    },
}
