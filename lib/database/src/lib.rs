#![doc(test(attr(deny(warnings))))]

pub mod catalog;
pub mod expr;
pub mod op;
pub mod renamer;
pub mod schema;
pub mod types;
pub mod vendor;

mod select_statement_builder;

pub use select_statement_builder::SelectStatementBuilder;
