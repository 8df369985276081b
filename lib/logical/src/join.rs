//! Parsing of join conditions between the tables of a relation.
//!
//! A join condition is written as `Table1.column1 = Table2.column2`. The arrows `<=` and `=>`
//! may be used instead of `=` to document the direction of a foreign key. They have the same
//! meaning as `=`.

use rdb2rdf_common::{CompilationError, CompileResult};
use rdb2rdf_database::expr::ColumnListEquality;
use rdb2rdf_database::schema::{ColumnList, ColumnName, TableName};
use std::collections::{BTreeMap, BTreeSet};

const OPERATORS: [&str; 3] = ["<=", "=>", "="];

/// Parses a single join condition into the two columns it equates.
pub fn parse_join_condition(condition: &str) -> CompileResult<(ColumnName, ColumnName)> {
    let (left, right) = OPERATORS
        .iter()
        .find_map(|operator| condition.split_once(operator))
        .ok_or_else(|| {
            CompilationError::InvalidJoin(format!(
                "\"{condition}\" is not in the form \"Table1.column1 = Table2.column2\""
            ))
        })?;
    let invalid = |e: CompilationError| {
        CompilationError::InvalidJoin(format!("\"{condition}\": {e}"))
    };
    let left = ColumnName::parse_qualified(left.trim()).map_err(invalid)?;
    let right = ColumnName::parse_qualified(right.trim()).map_err(invalid)?;
    if left.qualifier() == right.qualifier() {
        return Err(CompilationError::InvalidJoin(format!(
            "\"{condition}\" must relate two different tables"
        )));
    }
    Ok((left, right))
}

/// Parses a set of join conditions.
///
/// Conditions between the same pair of tables are combined into a single [`ColumnListEquality`].
pub fn parse_join_conditions<'a>(
    conditions: impl IntoIterator<Item = &'a str>,
) -> CompileResult<BTreeSet<ColumnListEquality>> {
    let mut grouped: BTreeMap<(TableName, TableName), (Vec<ColumnName>, Vec<ColumnName>)> =
        BTreeMap::new();
    for condition in conditions {
        let (mut left, mut right) = parse_join_condition(condition)?;
        if right.qualifier() < left.qualifier() {
            std::mem::swap(&mut left, &mut right);
        }
        let (Some(left_table), Some(right_table)) = (left.qualifier(), right.qualifier()) else {
            return CompilationError::internal(format!(
                "Join condition \"{condition}\" has unqualified columns"
            ));
        };
        let entry = grouped
            .entry((left_table.clone(), right_table.clone()))
            .or_default();
        entry.0.push(left);
        entry.1.push(right);
    }
    Ok(grouped
        .into_values()
        .map(|(left, right)| ColumnListEquality::new(ColumnList::new(left), ColumnList::new(right)))
        .collect())
}
