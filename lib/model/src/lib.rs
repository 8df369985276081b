mod pattern;
pub mod xsd;

pub use pattern::*;

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::vocab;
pub use oxrdf::{
    BlankNode, BlankNodeRef, IriParseError, Literal, LiteralRef, NamedNode, NamedNodeRef, Term,
    TermRef, Variable, VariableRef,
};
pub use spargebra::algebra::{
    AggregateExpression, Expression, Function, GraphPattern, OrderExpression,
    PropertyPathExpression,
};
pub use spargebra::term::{GroundTerm, NamedNodePattern, TermPattern, TriplePattern};
