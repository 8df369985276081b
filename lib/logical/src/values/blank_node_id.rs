use crate::values::ResultRow;
use rdb2rdf_database::expr::{ConstantType, Expression};
use rdb2rdf_database::renamer::Renamer;
use rdb2rdf_database::schema::ColumnName;
use std::fmt::{Display, Formatter};

const DELIMITER: &str = "@@";

/// Identifies a blank node by the id of the mapping that creates it and the values of some
/// columns: `classmap@@value1@@value2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankNodeId {
    class_map_id: String,
    columns: Vec<ColumnName>,
}

impl BlankNodeId {
    pub fn new(class_map_id: impl Into<String>, columns: Vec<ColumnName>) -> Self {
        Self {
            class_map_id: class_map_id.into(),
            columns,
        }
    }

    pub fn class_map_id(&self) -> &str {
        &self.class_map_id
    }

    pub fn columns(&self) -> &[ColumnName] {
        &self.columns
    }

    /// Checks the class map part of `value`.
    pub fn matches(&self, value: &str) -> bool {
        !self.value_expression(value).is_false()
    }

    pub fn value_expression(&self, value: &str) -> Expression {
        let mut parts = value.split(DELIMITER);
        if parts.next() != Some(self.class_map_id.as_str()) {
            return Expression::False;
        }
        let values = parts.collect::<Vec<_>>();
        if values.len() != self.columns.len() {
            return Expression::False;
        }
        Expression::conjunction(
            self.columns
                .iter()
                .zip(values)
                .map(|(column, value)| Expression::column_value(column, value)),
        )
    }

    pub fn make_value(&self, row: &dyn ResultRow) -> Option<String> {
        let mut result = self.class_map_id.clone();
        for column in &self.columns {
            result.push_str(DELIMITER);
            result.push_str(row.get(column)?);
        }
        Some(result)
    }

    pub fn to_expression(&self) -> Expression {
        let mut parts = vec![Expression::constant(
            self.class_map_id.clone(),
            ConstantType::Untyped,
        )];
        for column in &self.columns {
            parts.push(Expression::constant(DELIMITER, ConstantType::Untyped));
            parts.push(Expression::column(column.clone()));
        }
        Expression::concatenation(parts)
    }

    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> BlankNodeId {
        BlankNodeId {
            class_map_id: self.class_map_id.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| renamer.apply_to_column(c))
                .collect(),
        }
    }
}

impl Display for BlankNodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlankNodeId({}", self.class_map_id)?;
        for column in &self.columns {
            write!(f, ",{column}")?;
        }
        f.write_str(")")
    }
}
