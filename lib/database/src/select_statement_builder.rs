use crate::expr::Expression;
use crate::op::{combine_limits, AliasOp, DatabaseOp};
use crate::renamer::Renamer;
use crate::schema::{ColumnName, TableName};
use crate::vendor::Vendor;
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// Renders a [`DatabaseOp`] as a single `SELECT` statement.
///
/// Operators that cannot be expressed in the same statement as the operators above them
/// (e.g., a selection over a limit) are moved into a sub-query with a generated alias.
pub struct SelectStatementBuilder {
    op: DatabaseOp,
    vendor: Vendor,
    from: BTreeMap<TableName, String>,
    conditions: Vec<String>,
    projections: Option<HashMap<ColumnName, String>>,
    distinct: bool,
    order_by: Option<Vec<String>>,
    limit: Option<u64>,
}

impl SelectStatementBuilder {
    pub fn new(op: &DatabaseOp, vendor: Vendor) -> Self {
        let mut builder = Self {
            op: flatten(op),
            vendor,
            from: BTreeMap::new(),
            conditions: Vec::new(),
            projections: None,
            distinct: false,
            order_by: None,
            limit: None,
        };
        let op = builder.op.clone();
        builder.visit(&op);
        builder
    }

    pub fn sql(&self) -> String {
        let mut conditions = self.conditions.clone();
        let mut limit_clause = None;
        match self.limit {
            Some(0) => add_condition(&mut conditions, "1=0".to_owned()),
            Some(limit) => match self.vendor.limit_clause(limit) {
                Some(clause) => limit_clause = Some(clause),
                None => {
                    let condition = self.vendor.limit_condition(limit);
                    add_condition(&mut conditions, condition.to_sql(&self.op, self.vendor));
                }
            },
            None => {}
        }

        let mut result = String::from("SELECT ");
        if self.distinct {
            result.push_str("DISTINCT ");
        }
        result.push_str(&self.select_list());

        if self.from.is_empty() {
            if let Some(true_table) = self.vendor.true_table() {
                result.push_str("\nFROM ");
                result.push_str(true_table);
            }
        } else {
            result.push_str("\nFROM ");
            result.push_str(&self.from.values().join(", "));
        }
        if !conditions.is_empty() {
            result.push_str("\nWHERE ");
            result.push_str(&conditions.join(" AND "));
        }
        if let Some(order_by) = self.order_by.as_ref().filter(|o| !o.is_empty()) {
            result.push_str("\nORDER BY ");
            result.push_str(&order_by.join(", "));
        }
        if let Some(clause) = limit_clause {
            result.push('\n');
            result.push_str(&clause);
        }
        trace!(sql = %result, vendor = %self.vendor, "Rendered select statement");
        result
    }

    fn select_list(&self) -> String {
        let columns = self.op.columns();
        if columns.is_empty() {
            return "1".to_owned();
        }
        columns
            .iter()
            .map(|column| {
                self.projections
                    .as_ref()
                    .and_then(|projections| projections.get(column).cloned())
                    .unwrap_or_else(|| self.vendor.quote_column_name(column))
            })
            .join(", ")
    }

    fn visit(&mut self, op: &DatabaseOp) {
        match op {
            DatabaseOp::Unit => {}
            DatabaseOp::Table(_) | DatabaseOp::Sql(_) | DatabaseOp::Alias(_) => self.add_from(op),
            DatabaseOp::InnerJoin(join) => {
                for child in join.children() {
                    self.add_from(child);
                }
                for condition in join.conditions() {
                    add_condition(&mut self.conditions, condition.to_sql(self.vendor));
                }
            }
            DatabaseOp::Select(select) => {
                let operands = match select.condition() {
                    Expression::Conjunction(operands) => operands.clone(),
                    condition => vec![condition.clone()],
                };
                for operand in operands {
                    let sql = operand.to_sql(select.wrapped(), self.vendor);
                    add_condition(&mut self.conditions, sql);
                }
                self.visit(select.wrapped());
            }
            DatabaseOp::Project(project) => {
                if self.projections.is_none() {
                    let projections = project
                        .projections()
                        .iter()
                        .zip(project.columns())
                        .map(|(spec, column)| {
                            (column, spec.to_sql(project.wrapped(), self.vendor))
                        })
                        .collect();
                    self.projections = Some(projections);
                }
                self.visit(project.wrapped());
            }
            DatabaseOp::Distinct(inner) => {
                self.distinct = true;
                self.visit(inner);
            }
            DatabaseOp::Order(order) => {
                if self.order_by.is_none() {
                    let order_by = order
                        .order_by()
                        .iter()
                        .map(|spec| {
                            let sql = spec.expression().to_sql(order.wrapped(), self.vendor);
                            if spec.is_ascending() {
                                sql
                            } else {
                                format!("{sql} DESC")
                            }
                        })
                        .collect();
                    self.order_by = Some(order_by);
                }
                self.visit(order.wrapped());
            }
            DatabaseOp::Limit(limit) => {
                self.limit = combine_limits(self.limit, Some(limit.limit()));
                self.visit(limit.wrapped());
            }
            DatabaseOp::Empty(inner) => {
                add_condition(&mut self.conditions, "1=0".to_owned());
                self.visit(inner);
            }
            DatabaseOp::AssertUniqueKey(assert) => self.visit(assert.wrapped()),
        }
    }

    fn add_from(&mut self, op: &DatabaseOp) {
        let Some(name) = op.table_name() else {
            return;
        };
        let vendor = self.vendor;
        let rendered = match op {
            DatabaseOp::Sql(sql) => format!(
                "({}){}{}",
                sql.query(),
                vendor.alias_operator(),
                vendor.quote_table_name(name)
            ),
            DatabaseOp::Alias(alias) => match alias.original() {
                DatabaseOp::Table(table) => format!(
                    "{}{}{}",
                    vendor.quote_table_name(table.name()),
                    vendor.alias_operator(),
                    vendor.quote_table_name(name)
                ),
                original => format!(
                    "({}){}{}",
                    SelectStatementBuilder::new(original, vendor).sql(),
                    vendor.alias_operator(),
                    vendor.quote_table_name(name)
                ),
            },
            _ => vendor.quote_table_name(name),
        };
        self.from.insert(name.clone(), rendered);
    }
}

fn add_condition(conditions: &mut Vec<String>, condition: String) {
    if condition != "1=1" && !conditions.contains(&condition) {
        conditions.push(condition);
    }
}

/// The clause of a select statement an operator maps to. Within one statement, operators must
/// be nested in decreasing order.
fn stage(op: &DatabaseOp) -> u8 {
    match op {
        DatabaseOp::Select(_) => 1,
        DatabaseOp::Project(_) => 2,
        DatabaseOp::Distinct(_) => 3,
        DatabaseOp::Order(_) => 4,
        DatabaseOp::Limit(_) => 5,
        DatabaseOp::Empty(inner) => stage(inner),
        DatabaseOp::AssertUniqueKey(assert) => stage(assert.wrapped()),
        DatabaseOp::Unit
        | DatabaseOp::Table(_)
        | DatabaseOp::Sql(_)
        | DatabaseOp::Alias(_)
        | DatabaseOp::InnerJoin(_) => 0,
    }
}

/// Moves operators that are out of order into aliased sub-queries.
fn flatten(op: &DatabaseOp) -> DatabaseOp {
    let Some(wrapped) = op.wrapped() else {
        return op.clone();
    };
    if matches!(op, DatabaseOp::Alias(_)) {
        return op.clone();
    }
    let wrapped = flatten(wrapped);
    let nests = match op {
        DatabaseOp::Empty(_) | DatabaseOp::AssertUniqueKey(_) => false,
        op => stage(&wrapped) >= stage(op),
    };
    if !nests {
        return rebuild(op, wrapped, &Renamer::identity());
    }
    let alias = AliasOp::with_unique_name(wrapped, "SUBQUERY");
    let renamer = alias.renamer();
    rebuild(op, DatabaseOp::Alias(alias), &renamer)
}

/// Places `op` over `wrapped`, renaming the columns referenced by `op`.
fn rebuild(op: &DatabaseOp, wrapped: DatabaseOp, renamer: &Renamer) -> DatabaseOp {
    match op {
        DatabaseOp::Select(select) => wrapped.select(select.condition().rename(renamer)),
        DatabaseOp::Project(project) => wrapped.project(
            project
                .projections()
                .iter()
                .map(|spec| spec.rename(renamer))
                .collect(),
        ),
        DatabaseOp::Distinct(_) => wrapped.distinct(),
        DatabaseOp::Order(order) => wrapped.order(
            order
                .order_by()
                .iter()
                .map(|spec| spec.rename(renamer))
                .collect(),
        ),
        DatabaseOp::Limit(limit) => wrapped.limit(Some(limit.limit())),
        DatabaseOp::Empty(_) => wrapped.empty(),
        DatabaseOp::AssertUniqueKey(assert) => wrapped.assert_unique_key(
            assert
                .key()
                .iter()
                .map(|c| renamer.apply_to_column(c))
                .collect(),
        ),
        DatabaseOp::Unit
        | DatabaseOp::Table(_)
        | DatabaseOp::Sql(_)
        | DatabaseOp::Alias(_)
        | DatabaseOp::InnerJoin(_) => op.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{OrderSpec, ProjectionSpec, TableOp};
    use crate::schema::Identifier;
    use crate::types::GenericType;

    fn papers() -> DatabaseOp {
        DatabaseOp::table(
            TableOp::new(TableName::parse("papers").unwrap())
                .with_column(
                    Identifier::undelimited("id"),
                    GenericType::Numeric.data_type(),
                    false,
                )
                .with_column(
                    Identifier::undelimited("year"),
                    GenericType::Numeric.data_type(),
                    true,
                ),
        )
    }

    fn col(name: &str) -> ColumnName {
        ColumnName::parse(name).unwrap()
    }

    #[test]
    fn test_unit() {
        insta::assert_snapshot!(
            SelectStatementBuilder::new(&DatabaseOp::Unit, Vendor::Sql92).sql(),
            @r"
        SELECT 1
        FROM (VALUES(NULL))
        "
        );
        insta::assert_snapshot!(
            SelectStatementBuilder::new(&DatabaseOp::Unit, Vendor::PostgreSql).sql(),
            @"SELECT 1"
        );
    }

    #[test]
    fn test_select_project() {
        let op = papers()
            .select(Expression::column_value(&col("papers.year"), "2002"))
            .project(vec![ProjectionSpec::column(col("papers.id"))]);
        insta::assert_snapshot!(SelectStatementBuilder::new(&op, Vendor::Sql92).sql(), @r"
        SELECT papers.id
        FROM papers
        WHERE papers.year = 2002
        ");
    }

    #[test]
    fn test_limit_and_order() {
        let op = papers()
            .order(vec![OrderSpec::descending(Expression::column(col("papers.year")))])
            .limit(Some(10));
        insta::assert_snapshot!(SelectStatementBuilder::new(&op, Vendor::MySql).sql(), @r"
        SELECT papers.id, papers.year
        FROM papers
        ORDER BY papers.year DESC
        LIMIT 10
        ");
        insta::assert_snapshot!(SelectStatementBuilder::new(&op, Vendor::Oracle).sql(), @r"
        SELECT papers.id, papers.year
        FROM papers
        WHERE (ROWNUM <= 10)
        ORDER BY papers.year DESC
        ");
    }

    #[test]
    fn test_empty() {
        let op = papers().select(Expression::False);
        insta::assert_snapshot!(SelectStatementBuilder::new(&op, Vendor::Sql92).sql(), @r"
        SELECT papers.id, papers.year
        FROM papers
        WHERE 1=0
        ");
    }

    #[test]
    fn test_selection_over_limit_is_nested() {
        let op = papers()
            .limit(Some(5))
            .select(Expression::column_value(&col("papers.year"), "2002"));
        let sql = SelectStatementBuilder::new(&op, Vendor::Sql92).sql();
        let nested = "FROM (SELECT papers.id, papers.year\nFROM papers\nLIMIT 5) AS \"SUBQUERY";
        assert!(sql.contains(nested), "{sql}");
        assert!(sql.ends_with(".year = 2002"));
    }
}
