//! Value makers turn the columns of a database row into the lexical value of an RDF term, and
//! turn a lexical value back into a condition on the columns.

mod blank_node_id;
mod column_function;
mod template;

pub use blank_node_id::BlankNodeId;
pub use column_function::ColumnFunction;
pub use template::Template;

use crate::nodes::NodeSetFilter;
use rdb2rdf_database::expr::{ConstantType, Expression};
use rdb2rdf_database::op::{OrderSpec, ProjectionSpec};
use rdb2rdf_database::renamer::Renamer;
use rdb2rdf_database::schema::ColumnName;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// A row of a query result.
pub trait ResultRow {
    /// The value of `column`, or `None` if it is `NULL`.
    fn get(&self, column: &ColumnName) -> Option<&str>;
}

impl ResultRow for BTreeMap<ColumnName, String> {
    fn get(&self, column: &ColumnName) -> Option<&str> {
        BTreeMap::get(self, column).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueMaker {
    Column(ColumnName),
    Template(Template),
    BlankNodeId(BlankNodeId),
    /// The value of an SQL expression.
    Expression(Expression),
}

impl ValueMaker {
    /// The condition that makes this value maker produce `value`. `FALSE` if it never does.
    pub fn value_expression(&self, value: &str) -> Expression {
        match self {
            ValueMaker::Column(column) => Expression::column_value(column, value),
            ValueMaker::Template(template) => template.value_expression(value),
            ValueMaker::BlankNodeId(id) => id.value_expression(value),
            ValueMaker::Expression(expression) => Expression::equal(
                expression.clone(),
                Expression::constant(value, ConstantType::Untyped),
            ),
        }
    }

    pub fn projection_specs(&self) -> Vec<ProjectionSpec> {
        match self {
            ValueMaker::Column(column) => vec![ProjectionSpec::column(column.clone())],
            ValueMaker::Template(template) => template
                .columns()
                .iter()
                .cloned()
                .map(ProjectionSpec::column)
                .collect(),
            ValueMaker::BlankNodeId(id) => id
                .columns()
                .iter()
                .cloned()
                .map(ProjectionSpec::column)
                .collect(),
            ValueMaker::Expression(expression) => {
                vec![ProjectionSpec::expression(expression.clone())]
            }
        }
    }

    pub fn make_value(&self, row: &dyn ResultRow) -> Option<String> {
        match self {
            ValueMaker::Column(column) => row.get(column).map(str::to_owned),
            ValueMaker::Template(template) => template.make_value(row),
            ValueMaker::BlankNodeId(id) => id.make_value(row),
            ValueMaker::Expression(expression) => {
                let spec = ProjectionSpec::expression(expression.clone());
                row.get(spec.column_name()).map(str::to_owned)
            }
        }
    }

    pub fn describe_self(&self, filter: &mut dyn NodeSetFilter) {
        match self {
            ValueMaker::Column(column) => filter.limit_values_to_column(column),
            ValueMaker::Template(template) => filter.limit_values_to_template(template),
            ValueMaker::BlankNodeId(id) => filter.limit_values_to_blank_node_id(id),
            ValueMaker::Expression(expression) => filter.limit_values_to_expression(expression),
        }
    }

    pub fn order_specs(&self, ascending: bool) -> Vec<OrderSpec> {
        let order = |expression| {
            if ascending {
                OrderSpec::ascending(expression)
            } else {
                OrderSpec::descending(expression)
            }
        };
        match self {
            ValueMaker::Expression(expression) => vec![order(expression.clone())],
            _ => self
                .projection_specs()
                .iter()
                .map(|spec| order(spec.to_expression()))
                .collect(),
        }
    }

    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> ValueMaker {
        match self {
            ValueMaker::Column(column) => ValueMaker::Column(renamer.apply_to_column(column)),
            ValueMaker::Template(template) => ValueMaker::Template(template.rename(renamer)),
            ValueMaker::BlankNodeId(id) => ValueMaker::BlankNodeId(id.rename(renamer)),
            ValueMaker::Expression(expression) => {
                ValueMaker::Expression(expression.rename(renamer))
            }
        }
    }
}

impl Display for ValueMaker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueMaker::Column(column) => write!(f, "{column}"),
            ValueMaker::Template(template) => write!(f, "{template}"),
            ValueMaker::BlankNodeId(id) => write!(f, "{id}"),
            ValueMaker::Expression(expression) => write!(f, "{expression}"),
        }
    }
}
