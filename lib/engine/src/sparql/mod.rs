mod assembler;
mod error;
mod explanation;
mod op;
pub mod rewriting;
mod sql_union;

pub use assembler::Assembler;
pub use error::NotConvertible;
pub use explanation::QueryExplanation;
pub use op::{bgp_variables, expression_variables, SparqlOp};
pub use sql_union::{SqlStatement, SqlUnion};
