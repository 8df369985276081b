use crate::expr::ColumnListEquality;
use crate::op::DatabaseOp;
use crate::renamer::Renamer;
use crate::schema::{ColumnList, ColumnName, TableName};
use rdb2rdf_common::{CompilationError, CompileResult};
use std::collections::{BTreeMap, BTreeSet};

/// An inner join of named relations.
///
/// Children are ordered by name. Filter conditions other than the join conditions are expressed
/// by a select on top of the join.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InnerJoinOp {
    children: Vec<DatabaseOp>,
    conditions: BTreeSet<ColumnListEquality>,
}

impl InnerJoinOp {
    /// Joins `children`. Every child must be named, and names must not clash.
    ///
    /// Joining a single relation without conditions returns the relation, joining nothing
    /// returns [`DatabaseOp::Unit`].
    pub fn join(
        children: Vec<DatabaseOp>,
        conditions: BTreeSet<ColumnListEquality>,
    ) -> CompileResult<DatabaseOp> {
        let mut by_name = BTreeMap::new();
        for child in children {
            let Some(name) = child.table_name().cloned() else {
                return Err(CompilationError::NonNamedJoinChild(child.to_string()));
            };
            if let Some(existing) = by_name.get(&name) {
                if existing != &child {
                    return Err(CompilationError::InvalidJoin(format!(
                        "two different relations are named {name}"
                    )));
                }
            }
            by_name.insert(name, child);
        }
        Ok(Self::from_named(by_name, conditions))
    }

    fn from_named(
        mut children: BTreeMap<TableName, DatabaseOp>,
        conditions: BTreeSet<ColumnListEquality>,
    ) -> DatabaseOp {
        if conditions.is_empty() {
            if children.is_empty() {
                return DatabaseOp::Unit;
            }
            if children.len() == 1 {
                if let Some((_, child)) = children.pop_first() {
                    return child;
                }
            }
        }
        DatabaseOp::InnerJoin(InnerJoinOp {
            children: children.into_values().collect(),
            conditions,
        })
    }

    pub fn children(&self) -> &[DatabaseOp] {
        &self.children
    }

    pub fn conditions(&self) -> &BTreeSet<ColumnListEquality> {
        &self.conditions
    }

    pub fn columns(&self) -> ColumnList {
        self.children
            .iter()
            .flat_map(|child| child.columns())
            .collect()
    }

    /// Returns the only child that has `column`.
    pub fn child_with_column(&self, column: &ColumnName) -> Option<&DatabaseOp> {
        let mut candidates = self.children.iter().filter(|c| c.has_column(column));
        let first = candidates.next()?;
        candidates.next().is_none().then_some(first)
    }

    pub fn unique_keys(&self) -> Vec<ColumnList> {
        match self.children.as_slice() {
            [child] => child.unique_keys(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn rename(&self, renamer: &Renamer) -> DatabaseOp {
        let children = self
            .children
            .iter()
            .map(|child| child.rename(renamer))
            .filter_map(|child| child.table_name().cloned().map(|name| (name, child)))
            .collect();
        let conditions = self
            .conditions
            .iter()
            .map(|condition| condition.rename(renamer))
            .collect();
        Self::from_named(children, conditions)
    }
}
