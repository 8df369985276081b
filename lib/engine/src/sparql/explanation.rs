use crate::sparql::SparqlOp;

/// Describes how a graph pattern was compiled.
#[derive(Debug)]
#[allow(clippy::struct_field_names)]
pub struct QueryExplanation {
    /// The time spent compiling the graph pattern.
    pub compilation_time: std::time::Duration,
    /// The operator tree created from the graph pattern.
    pub initial_op: SparqlOp,
    /// The operator tree after the filter push-down.
    pub pushed_down_op: SparqlOp,
    /// The final operator tree.
    pub assembled_op: SparqlOp,
}
