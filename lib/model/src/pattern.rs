use oxrdf::{Term, Variable};
use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
use std::fmt::{Display, Formatter};

/// The three positions of a triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TriplePosition {
    Subject,
    Predicate,
    Object,
}

impl TriplePosition {
    pub const ALL: [TriplePosition; 3] = [
        TriplePosition::Subject,
        TriplePosition::Predicate,
        TriplePosition::Object,
    ];
}

impl Display for TriplePosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TriplePosition::Subject => f.write_str("subject"),
            TriplePosition::Predicate => f.write_str("predicate"),
            TriplePosition::Object => f.write_str("object"),
        }
    }
}

/// Prefix of the variables that stand in for blank nodes of a basic graph pattern.
///
/// Regular SPARQL variables can never contain a `?`, so these names cannot clash.
const BLANK_NODE_VARIABLE_PREFIX: &str = "?";

/// Returns the variable that replaces a blank node of a basic graph pattern.
pub fn blank_node_variable(id: &str) -> Variable {
    Variable::new_unchecked(format!("{BLANK_NODE_VARIABLE_PREFIX}{id}"))
}

/// Returns whether `variable` was introduced for a blank node.
pub fn is_blank_node_variable(variable: &Variable) -> bool {
    variable.as_str().starts_with(BLANK_NODE_VARIABLE_PREFIX)
}

/// Returns the variable of a term pattern. Blank nodes are treated as variables.
pub fn term_pattern_variable(pattern: &TermPattern) -> Option<Variable> {
    match pattern {
        TermPattern::Variable(variable) => Some(variable.clone()),
        TermPattern::BlankNode(node) => Some(blank_node_variable(node.as_str())),
        TermPattern::NamedNode(_) | TermPattern::Literal(_) => None,
    }
}

/// Returns the concrete RDF term of a term pattern, if it is not a variable.
pub fn term_pattern_term(pattern: &TermPattern) -> Option<Term> {
    match pattern {
        TermPattern::NamedNode(node) => Some(Term::NamedNode(node.clone())),
        TermPattern::Literal(literal) => Some(Term::Literal(literal.clone())),
        TermPattern::Variable(_) | TermPattern::BlankNode(_) => None,
    }
}

/// Returns the variable at `position` of `pattern`.
pub fn position_variable(pattern: &TriplePattern, position: TriplePosition) -> Option<Variable> {
    match position {
        TriplePosition::Subject => term_pattern_variable(&pattern.subject),
        TriplePosition::Predicate => match &pattern.predicate {
            NamedNodePattern::Variable(variable) => Some(variable.clone()),
            NamedNodePattern::NamedNode(_) => None,
        },
        TriplePosition::Object => term_pattern_variable(&pattern.object),
    }
}

/// Returns the concrete RDF term at `position` of `pattern`.
pub fn position_term(pattern: &TriplePattern, position: TriplePosition) -> Option<Term> {
    match position {
        TriplePosition::Subject => term_pattern_term(&pattern.subject),
        TriplePosition::Predicate => match &pattern.predicate {
            NamedNodePattern::NamedNode(node) => Some(Term::NamedNode(node.clone())),
            NamedNodePattern::Variable(_) => None,
        },
        TriplePosition::Object => term_pattern_term(&pattern.object),
    }
}

/// Returns the distinct variables of `pattern` in subject, predicate, object order.
pub fn pattern_variables(pattern: &TriplePattern) -> Vec<Variable> {
    let mut result = Vec::new();
    for position in TriplePosition::ALL {
        if let Some(variable) = position_variable(pattern, position) {
            if !result.contains(&variable) {
                result.push(variable);
            }
        }
    }
    result
}
