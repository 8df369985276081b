#![doc(test(attr(deny(warnings))))]

pub mod bgp;
mod compiler;
pub mod sparql;

pub use compiler::QueryCompiler;
pub use sparql::{NotConvertible, QueryExplanation, SparqlOp, SqlStatement, SqlUnion};
