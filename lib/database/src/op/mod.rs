//! Relational algebra over the tables of a database.
//!
//! Operators are built through constructors that normalize the tree: selecting `TRUE` is a
//! no-op, selecting `FALSE` yields an empty operator, nested limits merge and so on. Consumers
//! can therefore rely on structural equality of equivalent trees.

mod alias;
mod inner_join;
mod order;
mod project;
mod select;
mod table;

pub use alias::AliasOp;
pub use inner_join::InnerJoinOp;
pub use order::{OrderOp, OrderSpec};
pub use project::{ProjectOp, ProjectionSpec};
pub use select::SelectOp;
pub use table::{ColumnDef, SqlOp, TableOp};

use crate::expr::Expression;
use crate::renamer::Renamer;
use crate::schema::{ColumnList, ColumnName, TableName};
use crate::types::DataType;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// A node of the relational algebra.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DatabaseOp {
    /// A relation with a single row and no columns.
    Unit,
    Table(Arc<TableOp>),
    Sql(Arc<SqlOp>),
    Alias(AliasOp),
    InnerJoin(InnerJoinOp),
    Select(SelectOp),
    Project(ProjectOp),
    Distinct(Arc<DatabaseOp>),
    Order(OrderOp),
    Limit(LimitOp),
    /// A relation with the columns of the wrapped operator but no rows.
    Empty(Arc<DatabaseOp>),
    AssertUniqueKey(AssertUniqueKeyOp),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LimitOp {
    wrapped: Arc<DatabaseOp>,
    limit: u64,
}

impl LimitOp {
    pub fn wrapped(&self) -> &DatabaseOp {
        &self.wrapped
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

/// Declares that `key` is unique in the wrapped relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssertUniqueKeyOp {
    wrapped: Arc<DatabaseOp>,
    key: ColumnList,
}

impl AssertUniqueKeyOp {
    pub fn wrapped(&self) -> &DatabaseOp {
        &self.wrapped
    }

    pub fn key(&self) -> &ColumnList {
        &self.key
    }
}

/// Combines two optional limits into the stricter one.
pub fn combine_limits(first: Option<u64>, second: Option<u64>) -> Option<u64> {
    match (first, second) {
        (Some(first), Some(second)) => Some(first.min(second)),
        (first, second) => first.or(second),
    }
}

impl DatabaseOp {
    pub fn table(table: TableOp) -> Self {
        DatabaseOp::Table(Arc::new(table))
    }

    pub fn sql(sql: SqlOp) -> Self {
        DatabaseOp::Sql(Arc::new(sql))
    }

    #[must_use]
    pub fn select(self, condition: Expression) -> Self {
        SelectOp::select(self, condition)
    }

    #[must_use]
    pub fn project(self, projections: Vec<ProjectionSpec>) -> Self {
        ProjectOp::project(self, projections)
    }

    #[must_use]
    pub fn order(self, order_by: Vec<OrderSpec>) -> Self {
        OrderOp::order(self, order_by)
    }

    /// Removes duplicate rows. No-op if the relation already has a unique key.
    #[must_use]
    pub fn distinct(self) -> Self {
        match self {
            DatabaseOp::Distinct(_) | DatabaseOp::Empty(_) => self,
            op if !op.unique_keys().is_empty() => op,
            op => DatabaseOp::Distinct(Arc::new(op)),
        }
    }

    /// Limits the number of rows. `None` means no limit.
    #[must_use]
    pub fn limit(self, limit: Option<u64>) -> Self {
        let Some(limit) = limit else {
            return self;
        };
        match self {
            DatabaseOp::Empty(_) => self,
            DatabaseOp::Limit(inner) => DatabaseOp::Limit(LimitOp {
                limit: inner.limit.min(limit),
                wrapped: inner.wrapped,
            }),
            op => DatabaseOp::Limit(LimitOp {
                wrapped: Arc::new(op),
                limit,
            }),
        }
    }

    /// Returns an operator with the same columns as `self` but no rows.
    #[must_use]
    pub fn empty(self) -> Self {
        match self {
            DatabaseOp::Empty(_) => self,
            op => DatabaseOp::Empty(Arc::new(op)),
        }
    }

    #[must_use]
    pub fn assert_unique_key(self, key: ColumnList) -> Self {
        if self.unique_keys().contains(&key) {
            return self;
        }
        DatabaseOp::AssertUniqueKey(AssertUniqueKeyOp {
            wrapped: Arc::new(self),
            key,
        })
    }

    /// The name of this operator, if it can appear in a `FROM` clause or inner join.
    pub fn table_name(&self) -> Option<&TableName> {
        match self {
            DatabaseOp::Table(table) => Some(table.name()),
            DatabaseOp::Sql(sql) => Some(sql.name()),
            DatabaseOp::Alias(alias) => Some(alias.alias()),
            _ => None,
        }
    }

    pub fn is_named(&self) -> bool {
        self.table_name().is_some()
    }

    /// The operator directly below this one, for operators that wrap a single child.
    pub fn wrapped(&self) -> Option<&DatabaseOp> {
        match self {
            DatabaseOp::Unit
            | DatabaseOp::Table(_)
            | DatabaseOp::Sql(_)
            | DatabaseOp::InnerJoin(_) => None,
            DatabaseOp::Alias(alias) => Some(alias.original()),
            DatabaseOp::Select(select) => Some(select.wrapped()),
            DatabaseOp::Project(project) => Some(project.wrapped()),
            DatabaseOp::Distinct(inner) | DatabaseOp::Empty(inner) => Some(inner),
            DatabaseOp::Order(order) => Some(order.wrapped()),
            DatabaseOp::Limit(limit) => Some(limit.wrapped()),
            DatabaseOp::AssertUniqueKey(assert) => Some(assert.wrapped()),
        }
    }

    /// The columns of the result. Columns are qualified unless they are computed.
    pub fn columns(&self) -> ColumnList {
        match self {
            DatabaseOp::Unit => ColumnList::default(),
            DatabaseOp::Table(table) => table.columns(),
            DatabaseOp::Sql(sql) => sql.shape().columns(),
            DatabaseOp::Alias(alias) => alias.columns(),
            DatabaseOp::InnerJoin(join) => join.columns(),
            DatabaseOp::Project(project) => project.columns(),
            _ => self
                .wrapped()
                .map(DatabaseOp::columns)
                .unwrap_or_default(),
        }
    }

    /// Resolves a possibly unqualified column name against the columns of this operator.
    pub fn resolve_column(&self, column: &ColumnName) -> Option<ColumnName> {
        self.columns().get(column).cloned()
    }

    pub fn has_column(&self, column: &ColumnName) -> bool {
        self.columns().contains(column)
    }

    pub fn column_type(&self, column: &ColumnName) -> Option<DataType> {
        match self {
            DatabaseOp::Unit => None,
            DatabaseOp::Table(table) => table.column_def(column).map(|c| c.data_type().clone()),
            DatabaseOp::Sql(sql) => sql
                .shape()
                .column_def(column)
                .map(|c| c.data_type().clone()),
            DatabaseOp::Alias(alias) => alias
                .original_column(column)
                .and_then(|c| alias.original().column_type(&c)),
            DatabaseOp::InnerJoin(join) => join
                .child_with_column(column)
                .and_then(|child| child.column_type(column)),
            DatabaseOp::Project(project) => project.column_type(column),
            _ => self.wrapped().and_then(|inner| inner.column_type(column)),
        }
    }

    /// Whether `column` may contain `NULL`. Unknown columns are considered nullable.
    pub fn is_nullable(&self, column: &ColumnName) -> bool {
        match self {
            DatabaseOp::Unit => true,
            DatabaseOp::Table(table) => {
                table.column_def(column).map_or(true, ColumnDef::is_nullable)
            }
            DatabaseOp::Sql(sql) => sql
                .shape()
                .column_def(column)
                .map_or(true, ColumnDef::is_nullable),
            DatabaseOp::Alias(alias) => alias
                .original_column(column)
                .map_or(true, |c| alias.original().is_nullable(&c)),
            DatabaseOp::InnerJoin(join) => join
                .child_with_column(column)
                .map_or(true, |child| child.is_nullable(column)),
            DatabaseOp::Project(project) => project.is_nullable(column),
            _ => self.wrapped().map_or(true, |inner| inner.is_nullable(column)),
        }
    }

    /// Column lists whose values are unique in the result.
    pub fn unique_keys(&self) -> Vec<ColumnList> {
        match self {
            DatabaseOp::Unit | DatabaseOp::Empty(_) => Vec::new(),
            DatabaseOp::Table(table) => table.unique_keys(),
            DatabaseOp::Sql(sql) => sql.shape().unique_keys(),
            DatabaseOp::Alias(alias) => alias.unique_keys(),
            DatabaseOp::InnerJoin(join) => join.unique_keys(),
            DatabaseOp::Project(project) => project.unique_keys(),
            DatabaseOp::Distinct(inner) => {
                let mut result = inner.unique_keys();
                let all = inner.columns();
                if !result.contains(&all) {
                    result.push(all);
                }
                result
            }
            DatabaseOp::AssertUniqueKey(assert) => {
                let mut result = assert.wrapped.unique_keys();
                if !result.contains(&assert.key) {
                    result.push(assert.key.clone());
                }
                result
            }
            DatabaseOp::Select(_) | DatabaseOp::Order(_) | DatabaseOp::Limit(_) => self
                .wrapped()
                .map(DatabaseOp::unique_keys)
                .unwrap_or_default(),
        }
    }

    /// Whether the operator is guaranteed to produce no rows.
    pub fn is_empty(&self) -> bool {
        match self {
            DatabaseOp::Empty(_) => true,
            DatabaseOp::Limit(limit) => limit.limit == 0 || limit.wrapped.is_empty(),
            DatabaseOp::Select(select) => {
                select.condition().is_false() || select.wrapped().is_empty()
            }
            DatabaseOp::InnerJoin(join) => join.children().iter().any(DatabaseOp::is_empty),
            DatabaseOp::Unit | DatabaseOp::Table(_) | DatabaseOp::Sql(_) => false,
            _ => self.wrapped().is_some_and(DatabaseOp::is_empty),
        }
    }

    /// Whether the operator produces exactly one row without columns that are read from a table.
    pub fn is_trivial(&self) -> bool {
        match self {
            DatabaseOp::Unit => true,
            DatabaseOp::Limit(limit) => limit.limit > 0 && limit.wrapped.is_trivial(),
            DatabaseOp::Alias(_)
            | DatabaseOp::Project(_)
            | DatabaseOp::Distinct(_)
            | DatabaseOp::Order(_)
            | DatabaseOp::AssertUniqueKey(_) => self.wrapped().is_some_and(DatabaseOp::is_trivial),
            DatabaseOp::Table(_)
            | DatabaseOp::Sql(_)
            | DatabaseOp::InnerJoin(_)
            | DatabaseOp::Select(_)
            | DatabaseOp::Empty(_) => false,
        }
    }

    /// Whether `column` has the same value in every row.
    ///
    /// Columns that do not exist are considered constant.
    pub fn is_constant_column(&self, column: &ColumnName) -> bool {
        let Some(column) = self.resolve_column(column) else {
            return true;
        };
        match self {
            DatabaseOp::Unit | DatabaseOp::Empty(_) => true,
            DatabaseOp::Table(_) | DatabaseOp::Sql(_) => false,
            DatabaseOp::Alias(alias) => alias
                .original_column(&column)
                .map_or(true, |c| alias.original().is_constant_column(&c)),
            DatabaseOp::InnerJoin(join) => join
                .child_with_column(&column)
                .map_or(true, |child| child.is_constant_column(&column)),
            DatabaseOp::Select(select) => {
                select.condition().forces_constant_column(&column)
                    || select.wrapped().is_constant_column(&column)
            }
            DatabaseOp::Project(project) => project.is_constant_column(&column),
            _ => self
                .wrapped()
                .map_or(true, |inner| inner.is_constant_column(&column)),
        }
    }

    /// Renames tables and columns.
    ///
    /// Renaming a base table wraps it into an alias with the new name. The subtree below an
    /// alias is a separate scope and is not renamed.
    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> DatabaseOp {
        if renamer.is_identity() {
            return self.clone();
        }
        match self {
            DatabaseOp::Unit => DatabaseOp::Unit,
            DatabaseOp::Table(_) | DatabaseOp::Sql(_) => {
                self.table_name().map_or_else(|| self.clone(), |name| {
                    let renamed = renamer.apply_to_table(name);
                    AliasOp::create_unchecked(self.clone(), renamed)
                })
            }
            DatabaseOp::Alias(alias) => AliasOp::create_unchecked(
                alias.original().clone(),
                renamer.apply_to_table(alias.alias()),
            ),
            DatabaseOp::InnerJoin(join) => join.rename(renamer),
            DatabaseOp::Select(select) => SelectOp::select(
                select.wrapped().rename(renamer),
                select.condition().rename(renamer),
            ),
            DatabaseOp::Project(project) => ProjectOp::project(
                project.wrapped().rename(renamer),
                project
                    .projections()
                    .iter()
                    .map(|p| p.rename(renamer))
                    .collect(),
            ),
            DatabaseOp::Distinct(inner) => inner.rename(renamer).distinct(),
            DatabaseOp::Order(order) => OrderOp::order(
                order.wrapped().rename(renamer),
                order
                    .order_by()
                    .iter()
                    .map(|spec| spec.rename(renamer))
                    .collect(),
            ),
            DatabaseOp::Limit(limit) => limit.wrapped.rename(renamer).limit(Some(limit.limit)),
            DatabaseOp::Empty(inner) => inner.rename(renamer).empty(),
            DatabaseOp::AssertUniqueKey(assert) => {
                assert.wrapped.rename(renamer).assert_unique_key(
                    assert
                        .key
                        .iter()
                        .map(|c| renamer.apply_to_column(c))
                        .collect(),
                )
            }
        }
    }

    /// Tables that are read by this operator.
    pub fn tables(&self) -> BTreeSet<TableName> {
        let mut result = BTreeSet::new();
        self.collect_tables(&mut result);
        result
    }

    fn collect_tables(&self, result: &mut BTreeSet<TableName>) {
        match self {
            DatabaseOp::Table(table) => {
                result.insert(table.name().clone());
            }
            DatabaseOp::Sql(sql) => {
                result.insert(sql.name().clone());
            }
            DatabaseOp::InnerJoin(join) => {
                for child in join.children() {
                    child.collect_tables(result);
                }
            }
            _ => {
                if let Some(inner) = self.wrapped() {
                    inner.collect_tables(result);
                }
            }
        }
    }

    fn fmt_indented(&self, f: &mut Formatter<'_>, indent: usize) -> std::fmt::Result {
        write!(f, "{:indent$}", "")?;
        match self {
            DatabaseOp::Unit => writeln!(f, "Unit")?,
            DatabaseOp::Table(table) => writeln!(f, "Table: {}", table.name())?,
            DatabaseOp::Sql(sql) => writeln!(f, "Sql: {} ({})", sql.name(), sql.query())?,
            DatabaseOp::Alias(alias) => writeln!(f, "Alias: {}", alias.alias())?,
            DatabaseOp::InnerJoin(join) => {
                write!(f, "InnerJoin:")?;
                for (i, condition) in join.conditions().iter().enumerate() {
                    let separator = if i == 0 { " " } else { ", " };
                    write!(f, "{separator}{condition}")?;
                }
                writeln!(f)?;
                for child in join.children() {
                    child.fmt_indented(f, indent + 2)?;
                }
                return Ok(());
            }
            DatabaseOp::Select(select) => writeln!(f, "Select: {}", select.condition())?,
            DatabaseOp::Project(project) => {
                write!(f, "Project:")?;
                for (i, spec) in project.projections().iter().enumerate() {
                    let separator = if i == 0 { " " } else { ", " };
                    write!(f, "{separator}{spec}")?;
                }
                writeln!(f)?;
            }
            DatabaseOp::Distinct(_) => writeln!(f, "Distinct")?,
            DatabaseOp::Order(order) => {
                write!(f, "Order:")?;
                for (i, spec) in order.order_by().iter().enumerate() {
                    let separator = if i == 0 { " " } else { ", " };
                    write!(f, "{separator}{spec}")?;
                }
                writeln!(f)?;
            }
            DatabaseOp::Limit(limit) => writeln!(f, "Limit: {}", limit.limit)?,
            DatabaseOp::Empty(_) => writeln!(f, "Empty")?,
            DatabaseOp::AssertUniqueKey(assert) => writeln!(f, "AssertUniqueKey: {}", assert.key)?,
        }
        if let Some(inner) = self.wrapped() {
            inner.fmt_indented(f, indent + 2)?;
        }
        Ok(())
    }
}

impl Display for DatabaseOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.fmt_indented(f, 0)
    }
}
