use crate::nodes::node_type::literal_shape;
use crate::nodes::NodeSetFilter;
use crate::values::{BlankNodeId, Template};
use rdb2rdf_database::expr::{ConstantType, Expression};
use rdb2rdf_database::schema::ColumnName;
use rdb2rdf_model::{NamedNode, Term};
use std::collections::BTreeSet;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Iri,
    Literal,
    BlankNode,
}

/// Collects the descriptions of several node makers and derives the condition under which they
/// all produce the same term.
///
/// This is used to join triple relations on a shared variable. If the node makers can never
/// produce the same term, the builder is empty and the condition is `FALSE`.
#[derive(Debug, Clone, Default)]
pub struct NodeSetConstraintBuilder {
    is_empty: bool,
    kind: Option<NodeKind>,
    constant_value: Option<String>,
    /// `None` until the first literal is seen. Then the language and the datatype.
    literal_shape: Option<(Option<String>, Option<NamedNode>)>,
    fixed_node: Option<Term>,
    columns: BTreeSet<ColumnName>,
    templates: BTreeSet<Template>,
    expressions: BTreeSet<Expression>,
    blank_node_ids: BTreeSet<BlankNodeId>,
    /// Every value starts with this prefix.
    value_start: String,
    /// Every value ends with this suffix.
    value_end: String,
}

impl NodeSetConstraintBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// Checks whether the condition cannot be expressed exactly in SQL. This is the case when
    /// templates with column functions must be compared with other values.
    pub fn is_unsupported(&self) -> bool {
        self.build_constraint().1
    }

    /// The condition under which all described node makers produce the same term.
    pub fn constraint(&self) -> Expression {
        let (constraint, unsupported) = self.build_constraint();
        if unsupported {
            warn!(
                "Joining templates that use column functions with other values is not supported"
            );
        }
        constraint
    }

    fn build_constraint(&self) -> (Expression, bool) {
        if self.is_empty {
            return (Expression::False, false);
        }
        let mut unsupported = false;
        let mut conditions = Vec::new();

        if let Some((first, rest)) = split_first(&self.columns) {
            conditions.extend(rest.map(|c| Expression::column_equality(first, c)));
        }
        if let Some((first, rest)) = split_first(&self.templates) {
            for other in rest {
                if first.is_equivalent_to(other) {
                    conditions.extend(
                        first
                            .columns()
                            .iter()
                            .zip(other.columns())
                            .map(|(l, r)| Expression::column_equality(l, r)),
                    );
                } else {
                    conditions.push(Expression::equal(
                        first.to_expression(),
                        other.to_expression(),
                    ));
                    unsupported |= first.uses_column_functions() || other.uses_column_functions();
                }
            }
        }
        if let Some((first, rest)) = split_first(&self.expressions) {
            conditions.extend(rest.map(|e| Expression::equal(first.clone(), e.clone())));
        }
        if let Some((first, rest)) = split_first(&self.blank_node_ids) {
            for other in rest {
                conditions.extend(
                    first
                        .columns()
                        .iter()
                        .zip(other.columns())
                        .map(|(l, r)| Expression::column_equality(l, r)),
                );
            }
        }

        let first_column = self.columns.first();
        let first_template = self.templates.first();
        let first_expression = self.expressions.first();
        let first_blank_node_id = self.blank_node_ids.first();
        if let Some(value) = &self.constant_value {
            if let Some(column) = first_column {
                conditions.push(Expression::column_value(column, value.clone()));
            }
            if let Some(id) = first_blank_node_id {
                conditions.push(id.value_expression(value));
            }
            if let Some(template) = first_template {
                conditions.push(template.value_expression(value));
            }
            if let Some(expression) = first_expression {
                conditions.push(Expression::equal(
                    expression.clone(),
                    Expression::constant(value.clone(), ConstantType::Untyped),
                ));
            }
        } else if let Some(column) = first_column {
            let column = Expression::column(column.clone());
            if let Some(id) = first_blank_node_id {
                conditions.push(Expression::equal(column.clone(), id.to_expression()));
            }
            if let Some(template) = first_template {
                conditions.push(Expression::equal(column.clone(), template.to_expression()));
                unsupported |= template.uses_column_functions();
            }
            if let Some(expression) = first_expression {
                conditions.push(Expression::equal(column, expression.clone()));
            }
        } else if let Some(expression) = first_expression {
            if let Some(id) = first_blank_node_id {
                conditions.push(Expression::equal(expression.clone(), id.to_expression()));
            }
            if let Some(template) = first_template {
                conditions.push(Expression::equal(
                    expression.clone(),
                    template.to_expression(),
                ));
                unsupported |= template.uses_column_functions();
            }
        } else if let (Some(template), Some(id)) = (first_template, first_blank_node_id) {
            conditions.push(Expression::equal(template.to_expression(), id.to_expression()));
            unsupported |= template.uses_column_functions();
        }
        (Expression::conjunction(conditions), unsupported)
    }

    fn limit_to_kind(&mut self, kind: NodeKind) {
        if self.is_empty {
            return;
        }
        match self.kind {
            None => self.kind = Some(kind),
            Some(existing) if existing == kind => {}
            Some(_) => self.limit_to_empty_set(),
        }
    }
}

fn split_first<'a, T>(
    set: &'a BTreeSet<T>,
) -> Option<(&'a T, impl Iterator<Item = &'a T> + 'a)> {
    let mut iter = set.iter();
    iter.next().map(|first| (first, iter))
}

impl NodeSetFilter for NodeSetConstraintBuilder {
    fn limit_to_empty_set(&mut self) {
        self.is_empty = true;
    }

    fn limit_to(&mut self, node: &Term) {
        if self.is_empty {
            return;
        }
        match &self.fixed_node {
            None => self.fixed_node = Some(node.clone()),
            Some(fixed) if fixed != node => self.limit_to_empty_set(),
            Some(_) => {}
        }
        match node {
            Term::NamedNode(node) => {
                self.limit_to_iris();
                self.limit_values(node.as_str());
            }
            Term::BlankNode(node) => {
                self.limit_to_blank_nodes();
                self.limit_values(node.as_str());
            }
            Term::Literal(literal) => {
                let (language, datatype) = literal_shape(literal.as_ref());
                self.limit_to_literals(language.as_deref(), datatype.as_ref());
                self.limit_values(literal.value());
            }
        }
    }

    fn limit_to_iris(&mut self) {
        self.limit_to_kind(NodeKind::Iri);
    }

    fn limit_to_blank_nodes(&mut self) {
        self.limit_to_kind(NodeKind::BlankNode);
    }

    fn limit_to_literals(&mut self, language: Option<&str>, datatype: Option<&NamedNode>) {
        if self.is_empty {
            return;
        }
        self.limit_to_kind(NodeKind::Literal);
        let shape = (language.map(str::to_owned), datatype.cloned());
        match &self.literal_shape {
            None => self.literal_shape = Some(shape),
            Some(existing) if *existing != shape => self.limit_to_empty_set(),
            Some(_) => {}
        }
    }

    fn limit_values(&mut self, value: &str) {
        if self.is_empty {
            return;
        }
        match &self.constant_value {
            None => self.constant_value = Some(value.to_owned()),
            Some(constant) if constant != value => {
                self.limit_to_empty_set();
                return;
            }
            Some(_) => {}
        }
        if !value.starts_with(&self.value_start) || !value.ends_with(&self.value_end) {
            self.limit_to_empty_set();
            return;
        }
        value.clone_into(&mut self.value_start);
        value.clone_into(&mut self.value_end);
        if self.templates.iter().any(|t| !t.matches(value))
            || self.blank_node_ids.iter().any(|id| !id.matches(value))
        {
            self.limit_to_empty_set();
        }
    }

    fn limit_values_to_column(&mut self, column: &ColumnName) {
        if !self.is_empty {
            self.columns.insert(column.clone());
        }
    }

    fn limit_values_to_template(&mut self, template: &Template) {
        if self.is_empty {
            return;
        }
        self.templates.insert(template.clone());
        let first = template.first_literal_part();
        if first.starts_with(&self.value_start) {
            first.clone_into(&mut self.value_start);
        } else if !self.value_start.starts_with(first) {
            self.limit_to_empty_set();
        }
        let last = template.last_literal_part();
        if last.ends_with(&self.value_end) {
            last.clone_into(&mut self.value_end);
        } else if !self.value_end.ends_with(last) {
            self.limit_to_empty_set();
        }
        if let Some(constant) = &self.constant_value {
            if !template.matches(constant) {
                self.limit_to_empty_set();
            }
        }
    }

    fn limit_values_to_blank_node_id(&mut self, id: &BlankNodeId) {
        if self.is_empty {
            return;
        }
        if self
            .blank_node_ids
            .first()
            .is_some_and(|first| first.class_map_id() != id.class_map_id())
        {
            self.limit_to_empty_set();
        }
        self.blank_node_ids.insert(id.clone());
    }

    fn limit_values_to_expression(&mut self, expression: &Expression) {
        if !self.is_empty {
            self.expressions.insert(expression.clone());
        }
    }
}
