use crate::bgp::AliasCounter;
use crate::sparql::rewriting::{push_down_filters, FunctionConverterRef};
use crate::sparql::{Assembler, QueryExplanation, SparqlOp};
use rdb2rdf_common::{CompileResult, CompilerConfig};
use rdb2rdf_logical::TripleRelation;
use rdb2rdf_model::GraphPattern;
use spargebra::Query;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Compiles SPARQL graph patterns against a set of table-to-triple mappings.
///
/// The compiler itself is immutable and can be shared between threads. Every compilation uses
/// its own alias counter, so queries can be compiled concurrently.
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    triple_relations: Arc<[TripleRelation]>,
    config: CompilerConfig,
    converters: Vec<FunctionConverterRef>,
}

impl QueryCompiler {
    pub fn new(
        triple_relations: impl IntoIterator<Item = TripleRelation>,
        config: CompilerConfig,
    ) -> Self {
        Self {
            triple_relations: triple_relations.into_iter().collect(),
            config,
            converters: Vec::new(),
        }
    }

    /// Registers a converter for functions that are not translated to SQL by default.
    #[must_use]
    pub fn with_function_converter(mut self, converter: FunctionConverterRef) -> Self {
        self.converters.push(converter);
        self
    }

    pub fn config(&self) -> CompilerConfig {
        self.config
    }

    pub fn triple_relations(&self) -> &[TripleRelation] {
        &self.triple_relations
    }

    /// Compiles `pattern` into an operator tree whose basic graph patterns are backed by SQL.
    pub fn compile(&self, pattern: &GraphPattern) -> CompileResult<SparqlOp> {
        Ok(self.explain(pattern)?.0)
    }

    /// Compiles the graph pattern of any query form.
    pub fn compile_query(&self, query: &Query) -> CompileResult<SparqlOp> {
        let pattern = match query {
            Query::Select { pattern, .. }
            | Query::Construct { pattern, .. }
            | Query::Describe { pattern, .. }
            | Query::Ask { pattern, .. } => pattern,
        };
        self.compile(pattern)
    }

    /// Compiles `pattern` and records the intermediate operator trees.
    pub fn explain(&self, pattern: &GraphPattern) -> CompileResult<(SparqlOp, QueryExplanation)> {
        let start = Instant::now();
        let initial_op = SparqlOp::from(pattern);
        let pushed_down_op = push_down_filters(initial_op.clone())?;
        let assembled_op = Assembler::new(&self.triple_relations, self.config)
            .with_converters(&self.converters)
            .assemble(pushed_down_op.clone(), &mut AliasCounter::new())?;
        let compilation_time = start.elapsed();
        debug!("Compiled graph pattern in {compilation_time:?}");

        let explanation = QueryExplanation {
            compilation_time,
            initial_op,
            pushed_down_op,
            assembled_op: assembled_op.clone(),
        };
        Ok((assembled_op, explanation))
    }
}
