//! Compiles SPARQL queries against the mappings of a relational database.
//!
//! The entry point of the module is the [`MappedDatabase`] struct.

use crate::error::{ConfigurationError, QueryCompilationError};
use rdb2rdf_common::CompilerConfig;
use rdb2rdf_engine::sparql::rewriting::FunctionConverterRef;
use rdb2rdf_engine::{QueryCompiler, QueryExplanation, SparqlOp, SqlStatement, SqlUnion};
use rdb2rdf_logical::TripleRelation;
use rdb2rdf_model::{GraphPattern, Variable};
use spargebra::{Query, SparqlParser};
use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use tracing::debug;

/// A relational database whose tables are exposed as RDF triples.
///
/// Queries are compiled into operator trees in which each basic graph pattern is replaced by
/// the SQL statements that produce its solutions.
#[derive(Clone)]
pub struct MappedDatabase {
    compiler: QueryCompiler,
    parser: SparqlParser,
}

impl MappedDatabase {
    /// Creates a mapped database from its table-to-triple mappings.
    pub fn new(
        triple_relations: impl IntoIterator<Item = TripleRelation>,
        config: CompilerConfig,
    ) -> Self {
        Self {
            compiler: QueryCompiler::new(triple_relations, config),
            parser: SparqlParser::new(),
        }
    }

    /// Makes `prefix` available in all queries.
    pub fn with_prefix(
        self,
        prefix: impl Into<String>,
        iri: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let iri = iri.into();
        let parser = self
            .parser
            .with_prefix(prefix, iri.clone())
            .map_err(|error| ConfigurationError::InvalidIri { iri, error })?;
        Ok(Self { parser, ..self })
    }

    /// Resolves relative IRIs of all queries against `base_iri`.
    pub fn with_base_iri(self, base_iri: impl Into<String>) -> Result<Self, ConfigurationError> {
        let iri = base_iri.into();
        let parser = self
            .parser
            .with_base_iri(iri.clone())
            .map_err(|error| ConfigurationError::InvalidIri { iri, error })?;
        Ok(Self { parser, ..self })
    }

    /// Translates calls of additional functions to SQL.
    #[must_use]
    pub fn with_function_converter(self, converter: FunctionConverterRef) -> Self {
        Self {
            compiler: self.compiler.with_function_converter(converter),
            ..self
        }
    }

    pub fn config(&self) -> CompilerConfig {
        self.compiler.config()
    }

    /// Compiles a SPARQL query.
    pub fn compile(&self, query: &str) -> Result<CompiledQuery, QueryCompilationError> {
        let query = self.parser.clone().parse_query(query)?;
        let op = self.compiler.compile_query(&query)?;
        Ok(CompiledQuery { op })
    }

    /// Compiles a SPARQL query and records the intermediate operator trees.
    pub fn explain(
        &self,
        query: &str,
    ) -> Result<(CompiledQuery, QueryExplanation), QueryCompilationError> {
        let query = self.parser.clone().parse_query(query)?;
        let (op, explanation) = self.compiler.explain(query_pattern(&query))?;
        debug!("Compiled query in {:?}", explanation.compilation_time);
        Ok((CompiledQuery { op }, explanation))
    }
}

impl Debug for MappedDatabase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedDatabase")
            .field("compiler", &self.compiler)
            .finish_non_exhaustive()
    }
}

fn query_pattern(query: &Query) -> &GraphPattern {
    match query {
        Query::Select { pattern, .. }
        | Query::Construct { pattern, .. }
        | Query::Describe { pattern, .. }
        | Query::Ask { pattern, .. } => pattern,
    }
}

/// A compiled SPARQL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    op: SparqlOp,
}

impl CompiledQuery {
    /// The operator tree of the query.
    pub fn op(&self) -> &SparqlOp {
        &self.op
    }

    pub fn into_op(self) -> SparqlOp {
        self.op
    }

    /// Returns whether the query is known to produce no solutions without asking the database.
    pub fn is_empty(&self) -> bool {
        produces_no_solutions(&self.op)
    }

    /// The variables bound by the SQL statements of the query.
    pub fn sql_variables(&self) -> BTreeSet<Variable> {
        self.sql_ops()
            .into_iter()
            .flat_map(|union| union.variables())
            .collect()
    }

    /// Renders the SQL statements of the query, in the order their operators appear in the
    /// tree.
    pub fn statements(&self) -> Result<Vec<SqlStatement>, QueryCompilationError> {
        let mut result = Vec::new();
        for union in self.sql_ops() {
            result.extend(union.statements()?);
        }
        Ok(result)
    }

    fn sql_ops(&self) -> Vec<&SqlUnion> {
        let mut result = Vec::new();
        let mut ops = vec![&self.op];
        while let Some(op) = ops.pop() {
            if let SparqlOp::Sql(union) = op {
                result.push(union);
            }
            // Children are pushed in reverse so that the left-most operator is visited first.
            ops.extend(op.children().into_iter().rev());
        }
        result
    }
}

fn produces_no_solutions(op: &SparqlOp) -> bool {
    match op {
        SparqlOp::Empty { .. } => true,
        SparqlOp::Filter { inner, .. }
        | SparqlOp::Graph { inner, .. }
        | SparqlOp::Extend { inner, .. }
        | SparqlOp::OrderBy { inner, .. }
        | SparqlOp::Project { inner, .. }
        | SparqlOp::Distinct { inner }
        | SparqlOp::Reduced { inner }
        | SparqlOp::Slice { inner, .. }
        | SparqlOp::Label { inner, .. } => produces_no_solutions(inner),
        SparqlOp::Join { left, right } => {
            produces_no_solutions(left) || produces_no_solutions(right)
        }
        SparqlOp::LeftJoin { left, .. } | SparqlOp::Minus { left, .. } => {
            produces_no_solutions(left)
        }
        SparqlOp::Union { left, right } => {
            produces_no_solutions(left) && produces_no_solutions(right)
        }
        // An aggregation over no solutions still produces one.
        SparqlOp::Group { .. }
        | SparqlOp::Bgp { .. }
        | SparqlOp::Path { .. }
        | SparqlOp::Values { .. }
        | SparqlOp::Service { .. }
        | SparqlOp::Sql(_) => false,
    }
}
