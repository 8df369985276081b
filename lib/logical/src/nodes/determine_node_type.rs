use crate::nodes::node_type::literal_shape;
use crate::nodes::{NodeMaker, NodeSetFilter, NodeType};
use crate::values::{BlankNodeId, Template};
use rdb2rdf_database::expr::Expression;
use rdb2rdf_database::schema::ColumnName;
use rdb2rdf_model::{NamedNode, Term};

/// Determines the type of the terms a node maker produces. Value restrictions are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetermineNodeType {
    is_empty: bool,
    node_type: Option<NodeType>,
}

impl DetermineNodeType {
    pub fn of(node_maker: &NodeMaker) -> Self {
        let mut result = Self::default();
        node_maker.describe_self(&mut result);
        result
    }

    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    pub fn node_type(&self) -> Option<&NodeType> {
        self.node_type.as_ref()
    }

    pub fn is_iri(&self) -> bool {
        matches!(self.node_type, Some(NodeType::Iri))
    }

    pub fn is_blank_node(&self) -> bool {
        matches!(self.node_type, Some(NodeType::BlankNode))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.node_type, Some(NodeType::Literal { .. }))
    }

    pub fn language(&self) -> Option<&str> {
        match &self.node_type {
            Some(NodeType::Literal { language, .. }) => language.as_deref(),
            _ => None,
        }
    }

    /// The datatype of literals. `None` for simple and language-tagged literals.
    pub fn datatype(&self) -> Option<&NamedNode> {
        match &self.node_type {
            Some(NodeType::Literal { datatype, .. }) => datatype.as_ref(),
            _ => None,
        }
    }
}

impl NodeSetFilter for DetermineNodeType {
    fn limit_to_empty_set(&mut self) {
        self.is_empty = true;
    }

    fn limit_to(&mut self, node: &Term) {
        self.node_type = Some(match node {
            Term::NamedNode(_) => NodeType::Iri,
            Term::BlankNode(_) => NodeType::BlankNode,
            Term::Literal(literal) => {
                let (language, datatype) = literal_shape(literal.as_ref());
                NodeType::Literal { language, datatype }
            }
        });
    }

    fn limit_to_iris(&mut self) {
        self.node_type = Some(NodeType::Iri);
    }

    fn limit_to_blank_nodes(&mut self) {
        self.node_type = Some(NodeType::BlankNode);
    }

    fn limit_to_literals(&mut self, language: Option<&str>, datatype: Option<&NamedNode>) {
        self.node_type = Some(NodeType::Literal {
            language: language.map(str::to_owned),
            datatype: datatype.cloned(),
        });
    }

    fn limit_values(&mut self, _value: &str) {}

    fn limit_values_to_column(&mut self, _column: &ColumnName) {}

    fn limit_values_to_template(&mut self, _template: &Template) {}

    fn limit_values_to_blank_node_id(&mut self, _id: &BlankNodeId) {}

    fn limit_values_to_expression(&mut self, _expression: &Expression) {}
}
