use crate::AliasMap;
use itertools::Itertools;
use rdb2rdf_common::{CompilationError, CompileResult};
use rdb2rdf_database::catalog::Database;
use rdb2rdf_database::expr::{ColumnListEquality, Expression};
use rdb2rdf_database::op::{
    combine_limits, AliasOp, DatabaseOp, InnerJoinOp, OrderSpec, ProjectionSpec,
};
use rdb2rdf_database::renamer::Renamer;
use rdb2rdf_database::schema::{ColumnName, TableName};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::trace;

/// A relation of a database, described by its parts rather than as an operator tree.
///
/// The parts can be combined with the parts of other relations, which is how triple relations
/// are joined. [`Relation::to_database_op`] lowers a relation to a [`DatabaseOp`].
///
/// Tables are referred to by the name they have within the relation. For aliased tables, this
/// is the alias. The [`AliasMap`] resolves aliases to the tables of the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    database: Option<Arc<Database>>,
    aliases: AliasMap,
    tables: BTreeSet<TableName>,
    join_conditions: BTreeSet<ColumnListEquality>,
    condition: Expression,
    /// Conditions that do not change the result but may help the database. They are
    /// dropped when relations with different soft conditions are combined.
    soft_condition: Expression,
    projections: BTreeSet<ProjectionSpec>,
    is_unique: bool,
    order: Vec<OrderSpec>,
    limit: Option<u64>,
    limit_inverse: Option<u64>,
}

impl Relation {
    /// The relation without rows.
    pub fn empty() -> Self {
        Self {
            condition: Expression::False,
            ..Self::unit()
        }
    }

    /// The relation with a single row and no columns.
    pub fn unit() -> Self {
        Self {
            database: None,
            aliases: AliasMap::default(),
            tables: BTreeSet::new(),
            join_conditions: BTreeSet::new(),
            condition: Expression::True,
            soft_condition: Expression::True,
            projections: BTreeSet::new(),
            is_unique: true,
            order: Vec::new(),
            limit: None,
            limit_inverse: None,
        }
    }

    pub fn builder(database: Arc<Database>) -> RelationBuilder {
        RelationBuilder::new(database)
    }

    pub fn database(&self) -> Option<&Arc<Database>> {
        self.database.as_ref()
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    pub fn tables(&self) -> &BTreeSet<TableName> {
        &self.tables
    }

    pub fn join_conditions(&self) -> &BTreeSet<ColumnListEquality> {
        &self.join_conditions
    }

    pub fn condition(&self) -> &Expression {
        &self.condition
    }

    pub fn soft_condition(&self) -> &Expression {
        &self.soft_condition
    }

    pub fn projections(&self) -> &BTreeSet<ProjectionSpec> {
        &self.projections
    }

    /// Whether the relation never contains duplicate rows.
    pub fn is_unique(&self) -> bool {
        self.is_unique
    }

    pub fn order(&self) -> &[OrderSpec] {
        &self.order
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn limit_inverse(&self) -> Option<u64> {
        self.limit_inverse
    }

    pub fn is_empty(&self) -> bool {
        self.condition.is_false()
    }

    /// A relation with a single row and no columns.
    pub fn is_trivial(&self) -> bool {
        self.tables.is_empty()
            && self.projections.is_empty()
            && self.join_conditions.is_empty()
            && self.condition.is_true()
    }

    /// Joins relations by combining their parts.
    ///
    /// The result is only unique if a single unique relation is joined.
    pub fn join(relations: &[Relation]) -> Relation {
        if relations.iter().any(Relation::is_empty) {
            return Relation::empty();
        }
        let mut result = Relation::unit();
        result.is_unique = relations.len() <= 1 && relations.iter().all(|r| r.is_unique);
        let mut conditions = Vec::with_capacity(relations.len());
        let mut soft_conditions = Vec::with_capacity(relations.len());
        for relation in relations {
            if result.database.is_none() {
                result.database.clone_from(&relation.database);
            }
            result.aliases = result.aliases.merge(&relation.aliases);
            result.tables.extend(relation.tables.iter().cloned());
            result
                .join_conditions
                .extend(relation.join_conditions.iter().cloned());
            result
                .projections
                .extend(relation.projections.iter().cloned());
            conditions.push(relation.condition.clone());
            soft_conditions.push(relation.soft_condition.clone());
            if result.order.is_empty() {
                result.order.clone_from(&relation.order);
            }
            result.limit = combine_limits(result.limit, relation.limit);
            result.limit_inverse = combine_limits(result.limit_inverse, relation.limit_inverse);
        }
        result.condition = Expression::conjunction(conditions);
        result.soft_condition = Expression::conjunction(soft_conditions);
        result
    }

    /// Adds `condition` to the selection condition.
    #[must_use]
    pub fn select(&self, condition: Expression) -> Relation {
        if condition.is_true() {
            return self.clone();
        }
        if condition.is_false() {
            return Relation::empty();
        }
        let mut result = self.clone();
        result.tables.extend(qualifiers(condition.columns()));
        result.condition = self.condition.clone().and(condition);
        result
    }

    /// Replaces the projection.
    #[must_use]
    pub fn project(&self, projections: impl IntoIterator<Item = ProjectionSpec>) -> Relation {
        let mut result = self.clone();
        result.projections = projections.into_iter().collect();
        result.tables.extend(qualifiers(
            result.projections.iter().flat_map(ProjectionSpec::columns),
        ));
        result
    }

    #[must_use]
    pub fn with_condition(&self, condition: Expression, soft_condition: Expression) -> Relation {
        Relation {
            condition,
            soft_condition,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_unique(&self, is_unique: bool) -> Relation {
        Relation {
            is_unique,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn order_by(&self, order: Vec<OrderSpec>) -> Relation {
        Relation {
            order,
            ..self.clone()
        }
    }

    /// Limits the number of rows. Combined with an existing limit, the smaller one wins.
    #[must_use]
    pub fn with_limit(&self, limit: Option<u64>) -> Relation {
        Relation {
            limit: combine_limits(self.limit, limit),
            ..self.clone()
        }
    }

    /// Exchanges the limit and the inverse limit.
    ///
    /// The inverse limit applies when the relation is used in the opposite direction, for
    /// example to find subjects for an object.
    #[must_use]
    pub fn swap_limits(&self) -> Relation {
        Relation {
            limit: self.limit_inverse,
            limit_inverse: self.limit,
            ..self.clone()
        }
    }

    /// Renames tables and columns. Renamed tables become aliases of their original.
    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> Relation {
        if renamer.is_identity() {
            return self.clone();
        }
        let mut aliases = self.aliases.rename(renamer);
        for table in &self.tables {
            let renamed = renamer.apply_to_table(table);
            if renamed != *table && !self.aliases.is_alias(table) {
                aliases = aliases.merge(&AliasMap::new([(renamed, table.clone())]));
            }
        }
        Relation {
            database: self.database.clone(),
            aliases,
            tables: self
                .tables
                .iter()
                .map(|t| renamer.apply_to_table(t))
                .collect(),
            join_conditions: self
                .join_conditions
                .iter()
                .map(|j| j.rename(renamer))
                .collect(),
            condition: self.condition.rename(renamer),
            soft_condition: self.soft_condition.rename(renamer),
            projections: self
                .projections
                .iter()
                .map(|p| p.rename(renamer))
                .collect(),
            is_unique: self.is_unique,
            order: self.order.iter().map(|o| o.rename(renamer)).collect(),
            limit: self.limit,
            limit_inverse: self.limit_inverse,
        }
    }

    /// The renamer that gives every table of this relation a name unique to `index`.
    pub fn prefix_renamer(&self, index: usize) -> Renamer {
        Renamer::for_tables(
            self.tables
                .iter()
                .map(|t| (t.clone(), self.aliases.original_of(t).with_prefix(index))),
        )
    }

    /// Makes `new` the name of the table currently named `old`.
    #[must_use]
    pub fn rename_single_relation(&self, old: &TableName, new: &TableName) -> Relation {
        self.rename(&Renamer::for_tables([(old.clone(), new.clone())]))
    }

    /// Lowers the relation to an operator tree:
    /// `Limit(Order(Distinct(Project(Select(Join(tables))))))`.
    pub fn to_database_op(&self) -> CompileResult<DatabaseOp> {
        let children = self
            .tables
            .iter()
            .map(|table| self.table_op(table))
            .collect::<CompileResult<Vec<_>>>()?;
        let mut op = InnerJoinOp::join(children, self.join_conditions.clone())?
            .select(self.condition.clone().and(self.soft_condition.clone()))
            .project(self.projections.iter().cloned().collect());
        if !self.is_unique {
            op = op.distinct();
        }
        let op = op.order(self.order.clone()).limit(self.limit);
        trace!(op = %op, "Lowered relation");
        Ok(op)
    }

    fn table_op(&self, table: &TableName) -> CompileResult<DatabaseOp> {
        let Some(database) = &self.database else {
            return CompilationError::internal(format!(
                "Relation refers to table {table} but has no database"
            ));
        };
        let original = self.aliases.original_of(table);
        let op = database
            .table(&original)
            .ok_or_else(|| CompilationError::UnknownTable(original.to_string()))?;
        if original == *table {
            Ok(op)
        } else {
            AliasOp::create(op, table)
        }
    }
}

fn qualifiers(columns: impl IntoIterator<Item = ColumnName>) -> Vec<TableName> {
    columns
        .into_iter()
        .filter_map(|c| c.qualifier().cloned())
        .collect()
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let tables = self.tables.iter().map(|table| {
            let original = self.aliases.original_of(table);
            if original == *table {
                table.to_string()
            } else {
                format!("{original} AS {table}")
            }
        });
        write!(f, "Relation({}", tables.format(", "))?;
        if !self.condition.is_true() {
            write!(f, " WHERE {}", self.condition)?;
        }
        f.write_str(")")
    }
}

/// Builds the relation of a mapping.
#[derive(Debug, Clone)]
pub struct RelationBuilder {
    relation: Relation,
}

impl RelationBuilder {
    pub fn new(database: Arc<Database>) -> Self {
        Self {
            relation: Relation {
                database: Some(database),
                ..Relation::unit()
            },
        }
    }

    #[must_use]
    pub fn add_table(mut self, table: TableName) -> Self {
        self.relation.tables.insert(table);
        self
    }

    /// Adds the aliases. Every alias also becomes a table of the relation.
    #[must_use]
    pub fn add_aliases(mut self, aliases: &AliasMap) -> Self {
        self.relation
            .tables
            .extend(aliases.iter().map(|(alias, _)| alias.clone()));
        self.relation.aliases = self.relation.aliases.merge(aliases);
        self
    }

    #[must_use]
    pub fn add_join_conditions(
        mut self,
        join_conditions: impl IntoIterator<Item = ColumnListEquality>,
    ) -> Self {
        for join in join_conditions {
            self.relation.tables.extend(join.tables().cloned());
            self.relation.join_conditions.insert(join);
        }
        self
    }

    #[must_use]
    pub fn add_condition(mut self, condition: Expression) -> Self {
        self.relation.tables.extend(qualifiers(condition.columns()));
        self.relation.condition = self.relation.condition.and(condition);
        self
    }

    #[must_use]
    pub fn add_soft_condition(mut self, condition: Expression) -> Self {
        self.relation.tables.extend(qualifiers(condition.columns()));
        self.relation.soft_condition = self.relation.soft_condition.and(condition);
        self
    }

    #[must_use]
    pub fn add_projection(mut self, projection: ProjectionSpec) -> Self {
        self.relation.tables.extend(qualifiers(projection.columns()));
        self.relation.projections.insert(projection);
        self
    }

    #[must_use]
    pub fn unique(mut self, is_unique: bool) -> Self {
        self.relation.is_unique = is_unique;
        self
    }

    #[must_use]
    pub fn order_by(mut self, order: Vec<OrderSpec>) -> Self {
        self.relation.order = order;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.relation.limit = limit;
        self
    }

    #[must_use]
    pub fn limit_inverse(mut self, limit: Option<u64>) -> Self {
        self.relation.limit_inverse = limit;
        self
    }

    pub fn build(self) -> Relation {
        self.relation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::parse_join_conditions;
    use rdb2rdf_database::op::TableOp;
    use rdb2rdf_database::schema::Identifier;
    use rdb2rdf_database::types::GenericType;
    use rdb2rdf_database::vendor::Vendor;

    fn database() -> Arc<Database> {
        let table = |name: &str, columns: &[&str]| {
            columns.iter().fold(
                TableOp::new(TableName::parse(name).unwrap())
                    .with_unique_key(vec![Identifier::undelimited("id")]),
                |table, column| {
                    table.with_column(
                        Identifier::undelimited(*column),
                        GenericType::Numeric.data_type(),
                        *column != "id",
                    )
                },
            )
        };
        Arc::new(
            Database::new("db", Vendor::Sql92)
                .with_table(table("papers", &["id", "year", "author"]))
                .with_table(table("people", &["id", "born"])),
        )
    }

    fn column(name: &str) -> ColumnName {
        ColumnName::parse(name).unwrap()
    }

    fn authorship() -> Relation {
        Relation::builder(database())
            .add_join_conditions(parse_join_conditions(["papers.author = people.id"]).unwrap())
            .add_projection(ProjectionSpec::column(column("papers.id")))
            .add_projection(ProjectionSpec::column(column("people.id")))
            .build()
    }

    #[test]
    fn test_builder_collects_tables() {
        let relation = authorship();
        assert_eq!(relation.tables().len(), 2);
        insta::assert_snapshot!(relation, @"Relation(papers, people)");
    }

    #[test]
    fn test_to_database_op() {
        let relation = authorship()
            .select(Expression::column_value(&column("papers.year"), "2002"))
            .with_limit(Some(10));
        insta::assert_snapshot!(relation.to_database_op().unwrap(), @r"
        Limit: 10
          Distinct
            Project: papers.id, people.id
              Select: Equality(papers.year, Constant(2002@papers.year))
                InnerJoin: Join(papers.author = people.id)
                  Table: papers
                  Table: people
        ");
    }

    #[test]
    fn test_with_prefix_creates_aliases() {
        let relation = authorship();
        let renamed = relation.rename(&relation.prefix_renamer(3));
        insta::assert_snapshot!(
            renamed,
            @r#"Relation(papers AS "T3_papers", people AS "T3_people")"#
        );
        assert_eq!(
            renamed.projections().iter().next(),
            Some(&ProjectionSpec::column(column(r#""T3_papers".id"#)))
        );
        let op = renamed.to_database_op().unwrap();
        assert_eq!(op.tables().len(), 2);
    }

    #[test]
    fn test_rename_single_relation() {
        let relation = authorship().rename(&authorship().prefix_renamer(1));
        let t1 = TableName::parse(r#""T1_papers""#).unwrap();
        let t2 = TableName::parse(r#""T2_papers""#).unwrap();
        let renamed = relation.rename_single_relation(&t1, &t2);
        assert!(renamed.tables().contains(&t2));
        assert!(!renamed.tables().contains(&t1));
        assert_eq!(
            renamed.aliases().original_of(&t2),
            TableName::parse("papers").unwrap()
        );
    }

    #[test]
    fn test_join() {
        let papers = Relation::builder(database())
            .add_projection(ProjectionSpec::column(column("papers.id")))
            .add_condition(Expression::column_value(&column("papers.year"), "2002"))
            .build();
        let joined = Relation::join(&[papers.clone(), authorship()]);
        assert_eq!(joined.tables().len(), 2);
        assert_eq!(joined.projections().len(), 2);
        assert!(!joined.is_unique());
        assert_eq!(joined.condition(), papers.condition());
        assert_eq!(Relation::join(&[papers.clone()]), papers);
        assert!(Relation::join(&[papers, Relation::empty()]).is_empty());
        assert!(Relation::join(&[]).is_trivial());
    }

    #[test]
    fn test_unknown_table() {
        let relation = Relation::builder(database())
            .add_table(TableName::parse("authors").unwrap())
            .build();
        assert!(matches!(
            relation.to_database_op(),
            Err(CompilationError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_swap_limits() {
        let relation = authorship().with_limit(Some(5)).swap_limits();
        assert_eq!(relation.limit(), None);
        assert_eq!(relation.limit_inverse(), Some(5));
    }
}
