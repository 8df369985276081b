//! Node makers create the RDF terms of a triple from a database row.

mod binding_maker;
mod constraint_builder;
mod determine_node_type;
mod node_type;

pub use binding_maker::BindingMaker;
pub use constraint_builder::NodeSetConstraintBuilder;
pub use determine_node_type::DetermineNodeType;
pub use node_type::NodeType;

use crate::values::{BlankNodeId, ResultRow, Template, ValueMaker};
use rdb2rdf_database::expr::Expression;
use rdb2rdf_database::op::{OrderSpec, ProjectionSpec};
use rdb2rdf_database::renamer::Renamer;
use rdb2rdf_database::schema::ColumnName;
use rdb2rdf_model::{NamedNode, Term};
use std::fmt::{Display, Formatter};

/// Receives the description of the set of terms a node maker can produce.
///
/// Node makers describe themselves through a sequence of calls on a filter. Each call further
/// limits the set.
pub trait NodeSetFilter {
    fn limit_to_empty_set(&mut self);

    fn limit_to(&mut self, node: &Term);

    fn limit_to_iris(&mut self);

    fn limit_to_blank_nodes(&mut self);

    /// Limits the set to literals with the given language and datatype. Both are `None` for
    /// simple literals.
    fn limit_to_literals(&mut self, language: Option<&str>, datatype: Option<&NamedNode>);

    fn limit_values(&mut self, value: &str);

    fn limit_values_to_column(&mut self, column: &ColumnName);

    fn limit_values_to_template(&mut self, template: &Template);

    fn limit_values_to_blank_node_id(&mut self, id: &BlankNodeId);

    fn limit_values_to_expression(&mut self, expression: &Expression);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeMaker {
    /// Produces no terms.
    Empty,
    /// Always produces the same term.
    Fixed { node: Term, is_unique: bool },
    /// Produces terms of one type from the values of a value maker.
    Typed {
        node_type: NodeType,
        value_maker: ValueMaker,
        is_unique: bool,
    },
}

impl NodeMaker {
    pub fn fixed(node: Term) -> Self {
        NodeMaker::Fixed {
            node,
            is_unique: true,
        }
    }

    pub fn typed(node_type: NodeType, value_maker: ValueMaker, is_unique: bool) -> Self {
        NodeMaker::Typed {
            node_type,
            value_maker,
            is_unique,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NodeMaker::Empty)
    }

    /// Whether every row of the relation produces a different term.
    pub fn is_unique(&self) -> bool {
        match self {
            NodeMaker::Empty => true,
            NodeMaker::Fixed { is_unique, .. } | NodeMaker::Typed { is_unique, .. } => *is_unique,
        }
    }

    pub fn node_type(&self) -> Option<&NodeType> {
        match self {
            NodeMaker::Typed { node_type, .. } => Some(node_type),
            NodeMaker::Empty | NodeMaker::Fixed { .. } => None,
        }
    }

    pub fn value_maker(&self) -> Option<&ValueMaker> {
        match self {
            NodeMaker::Typed { value_maker, .. } => Some(value_maker),
            NodeMaker::Empty | NodeMaker::Fixed { .. } => None,
        }
    }

    /// The columns that must be selected to create the terms.
    pub fn projection_specs(&self) -> Vec<ProjectionSpec> {
        self.value_maker()
            .map(ValueMaker::projection_specs)
            .unwrap_or_default()
    }

    pub fn order_specs(&self, ascending: bool) -> Vec<OrderSpec> {
        self.value_maker()
            .map(|maker| maker.order_specs(ascending))
            .unwrap_or_default()
    }

    /// Restricts the node maker to `node`.
    ///
    /// Returns the restricted node maker and the condition the relation must satisfy so that
    /// the node maker produces `node`. The node maker is [`NodeMaker::Empty`] and the condition
    /// is `FALSE` if `node` can never be produced.
    pub fn select_node(&self, node: &Term) -> (NodeMaker, Expression) {
        match self {
            NodeMaker::Fixed { node: fixed, .. } if fixed == node => {
                (self.clone(), Expression::True)
            }
            NodeMaker::Empty | NodeMaker::Fixed { .. } => (NodeMaker::Empty, Expression::False),
            NodeMaker::Typed {
                node_type,
                value_maker,
                is_unique,
            } => {
                let Some(value) = node_type.extract_value(node) else {
                    return (NodeMaker::Empty, Expression::False);
                };
                let condition = value_maker.value_expression(&value);
                if condition.is_false() {
                    return (NodeMaker::Empty, Expression::False);
                }
                let fixed = NodeMaker::Fixed {
                    node: node.clone(),
                    is_unique: *is_unique,
                };
                (fixed, condition)
            }
        }
    }

    pub fn describe_self(&self, filter: &mut dyn NodeSetFilter) {
        match self {
            NodeMaker::Empty => filter.limit_to_empty_set(),
            NodeMaker::Fixed { node, .. } => filter.limit_to(node),
            NodeMaker::Typed {
                node_type,
                value_maker,
                ..
            } => {
                node_type.describe_self(filter);
                value_maker.describe_self(filter);
            }
        }
    }

    /// Creates the term for `row`. Returns `None` if the row does not produce a term, for
    /// example because of a `NULL` value.
    pub fn make_node(&self, row: &dyn ResultRow) -> Option<Term> {
        match self {
            NodeMaker::Empty => None,
            NodeMaker::Fixed { node, .. } => Some(node.clone()),
            NodeMaker::Typed {
                node_type,
                value_maker,
                ..
            } => node_type.make_node(&value_maker.make_value(row)?),
        }
    }

    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> NodeMaker {
        match self {
            NodeMaker::Empty | NodeMaker::Fixed { .. } => self.clone(),
            NodeMaker::Typed {
                node_type,
                value_maker,
                is_unique,
            } => NodeMaker::Typed {
                node_type: node_type.clone(),
                value_maker: value_maker.rename(renamer),
                is_unique: *is_unique,
            },
        }
    }
}

impl Display for NodeMaker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeMaker::Empty => f.write_str("Empty"),
            NodeMaker::Fixed { node, .. } => write!(f, "Fixed({node})"),
            NodeMaker::Typed {
                node_type,
                value_maker,
                ..
            } => write!(f, "{node_type}({value_maker})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn paper() -> NodeMaker {
        NodeMaker::typed(
            NodeType::Iri,
            ValueMaker::Template(Template::parse("http://ex.org/paper/@@papers.id@@").unwrap()),
            true,
        )
    }

    fn iri(iri: &str) -> Term {
        Term::NamedNode(NamedNode::new(iri).unwrap())
    }

    #[test]
    fn test_select_matching_node() {
        let (maker, condition) = paper().select_node(&iri("http://ex.org/paper/7"));
        assert_eq!(maker, NodeMaker::fixed(iri("http://ex.org/paper/7")));
        insta::assert_snapshot!(condition, @"Equality(papers.id, Constant(7@papers.id))");
    }

    #[test]
    fn test_select_mismatching_node() {
        let (maker, condition) = paper().select_node(&iri("http://ex.org/person/7"));
        assert!(maker.is_empty());
        assert!(condition.is_false());
        let literal = Term::Literal(rdb2rdf_model::Literal::new_simple_literal("7"));
        assert!(paper().select_node(&literal).0.is_empty());
    }

    #[test]
    fn test_make_node() {
        let row = BTreeMap::from([(ColumnName::parse("papers.id").unwrap(), "7".to_owned())]);
        assert_eq!(paper().make_node(&row), Some(iri("http://ex.org/paper/7")));
        assert_eq!(paper().make_node(&BTreeMap::new()), None);
        insta::assert_snapshot!(paper(), @"URI(Template(http://ex.org/paper/@@papers.id@@))");
    }

    #[test]
    fn test_rename() {
        let renamer = Renamer::for_tables([(
            rdb2rdf_database::schema::TableName::parse("papers").unwrap(),
            rdb2rdf_database::schema::TableName::parse("T1_papers").unwrap(),
        )]);
        assert_eq!(
            paper().rename(&renamer).projection_specs(),
            vec![ProjectionSpec::column(
                ColumnName::parse("T1_papers.id").unwrap()
            )]
        );
    }
}
