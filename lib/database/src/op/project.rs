use crate::expr::Expression;
use crate::op::{AliasOp, DatabaseOp};
use crate::renamer::Renamer;
use crate::schema::{ColumnList, ColumnName, Identifier};
use crate::types::DataType;
use crate::vendor::Vendor;
use rustc_hash::FxHasher;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A column of a projection. Either an existing column or a computed one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProjectionSpec {
    Column(ColumnName),
    /// A computed column, named `EXPR` followed by a hash of the expression.
    Expression {
        expression: Expression,
        name: ColumnName,
    },
}

impl ProjectionSpec {
    pub fn column(column: ColumnName) -> Self {
        ProjectionSpec::Column(column)
    }

    pub fn expression(expression: Expression) -> Self {
        if let Expression::Column(column) = expression {
            return ProjectionSpec::Column(column);
        }
        let mut hasher = FxHasher::default();
        expression.hash(&mut hasher);
        let name = ColumnName::unqualified(Identifier::delimited(format!(
            "EXPR{:x}",
            hasher.finish()
        )));
        ProjectionSpec::Expression { expression, name }
    }

    /// The name of the column in the result.
    pub fn column_name(&self) -> &ColumnName {
        match self {
            ProjectionSpec::Column(column) => column,
            ProjectionSpec::Expression { name, .. } => name,
        }
    }

    pub fn to_expression(&self) -> Expression {
        match self {
            ProjectionSpec::Column(column) => Expression::column(column.clone()),
            ProjectionSpec::Expression { expression, .. } => expression.clone(),
        }
    }

    /// The columns read by this projection.
    pub fn columns(&self) -> BTreeSet<ColumnName> {
        match self {
            ProjectionSpec::Column(column) => BTreeSet::from([column.clone()]),
            ProjectionSpec::Expression { expression, .. } => expression.columns(),
        }
    }

    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> ProjectionSpec {
        match self {
            ProjectionSpec::Column(column) => {
                ProjectionSpec::Column(renamer.apply_to_column(column))
            }
            ProjectionSpec::Expression { expression, .. } => {
                ProjectionSpec::expression(expression.rename(renamer))
            }
        }
    }

    /// Renders the select list entry. `context` is the relation the projection reads from.
    pub fn to_sql(&self, context: &DatabaseOp, vendor: Vendor) -> String {
        match self {
            ProjectionSpec::Column(column) => vendor.quote_column_name(column),
            ProjectionSpec::Expression { expression, name } => {
                let expression = vendor.boolean_to_simple_expression(expression.clone());
                format!(
                    "{}{}{}",
                    expression.to_sql(context, vendor),
                    vendor.alias_operator(),
                    vendor.quote_column_name(name)
                )
            }
        }
    }
}

impl Display for ProjectionSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionSpec::Column(column) => write!(f, "{column}"),
            ProjectionSpec::Expression { expression, name } => write!(f, "{expression} AS {name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectOp {
    wrapped: Arc<DatabaseOp>,
    projections: Vec<ProjectionSpec>,
}

impl ProjectOp {
    /// Projects `op` to `projections`.
    ///
    /// Nested projections merge. A projection over a distinct relation moves below the distinct
    /// if every dropped column is constant. Otherwise the distinct relation is aliased and the
    /// projection reads from the alias.
    pub fn project(op: DatabaseOp, projections: Vec<ProjectionSpec>) -> DatabaseOp {
        let mut unique = Vec::with_capacity(projections.len());
        for spec in projections {
            if !unique.contains(&spec) {
                unique.push(spec);
            }
        }
        let projections = unique;

        if Self::is_identity(&op, &projections) {
            return op;
        }
        match op {
            DatabaseOp::Empty(inner) => {
                Self::project(Arc::unwrap_or_clone(inner), projections).empty()
            }
            DatabaseOp::Project(inner) => match inner.merge(&projections) {
                Some(merged) => Self::project(Arc::unwrap_or_clone(inner.wrapped), merged),
                None => Self::wrap(DatabaseOp::Project(inner), projections),
            },
            DatabaseOp::Distinct(inner) => {
                let needed = projections
                    .iter()
                    .flat_map(ProjectionSpec::columns)
                    .filter_map(|c| inner.resolve_column(&c))
                    .collect::<BTreeSet<_>>();
                let dropped_are_constant = inner
                    .columns()
                    .iter()
                    .filter(|c| !needed.contains(*c))
                    .all(|c| inner.is_constant_column(c));
                if dropped_are_constant {
                    Self::project(Arc::unwrap_or_clone(inner), projections).distinct()
                } else {
                    let alias = AliasOp::with_unique_name(DatabaseOp::Distinct(inner), "PROJECT");
                    let renamer = alias.renamer();
                    let projections = projections.iter().map(|p| p.rename(&renamer)).collect();
                    Self::wrap(DatabaseOp::Alias(alias), projections)
                }
            }
            op => Self::wrap(op, projections),
        }
    }

    fn wrap(op: DatabaseOp, projections: Vec<ProjectionSpec>) -> DatabaseOp {
        DatabaseOp::Project(ProjectOp {
            wrapped: Arc::new(op),
            projections,
        })
    }

    fn is_identity(op: &DatabaseOp, projections: &[ProjectionSpec]) -> bool {
        let resolved = projections
            .iter()
            .map(|p| match p {
                ProjectionSpec::Column(column) => op.resolve_column(column),
                ProjectionSpec::Expression { .. } => None,
            })
            .collect::<Option<Vec<_>>>();
        resolved.is_some_and(|resolved| resolved.iter().eq(op.columns().iter()))
    }

    /// Expresses `projections` of this projection's output directly over the wrapped relation.
    fn merge(&self, projections: &[ProjectionSpec]) -> Option<Vec<ProjectionSpec>> {
        projections
            .iter()
            .map(|spec| match spec {
                ProjectionSpec::Column(column) => self.output_spec(column).cloned(),
                ProjectionSpec::Expression { expression, .. } => expression
                    .columns()
                    .iter()
                    .all(|c| matches!(self.output_spec(c), Some(ProjectionSpec::Column(_))))
                    .then(|| spec.clone()),
            })
            .collect()
    }

    pub fn wrapped(&self) -> &DatabaseOp {
        &self.wrapped
    }

    pub fn projections(&self) -> &[ProjectionSpec] {
        &self.projections
    }

    fn output_name(&self, spec: &ProjectionSpec) -> ColumnName {
        match spec {
            ProjectionSpec::Column(column) => self
                .wrapped
                .resolve_column(column)
                .unwrap_or_else(|| column.clone()),
            ProjectionSpec::Expression { name, .. } => name.clone(),
        }
    }

    fn output_spec(&self, column: &ColumnName) -> Option<&ProjectionSpec> {
        self.projections
            .iter()
            .find(|spec| column.matches(&self.output_name(spec)))
    }

    pub fn columns(&self) -> ColumnList {
        self.projections
            .iter()
            .map(|spec| self.output_name(spec))
            .collect()
    }

    pub fn column_type(&self, column: &ColumnName) -> Option<DataType> {
        match self.output_spec(column)? {
            ProjectionSpec::Column(column) => self.wrapped.column_type(column),
            ProjectionSpec::Expression { expression, .. } => expression.data_type(&self.wrapped),
        }
    }

    pub fn is_nullable(&self, column: &ColumnName) -> bool {
        match self.output_spec(column) {
            None => true,
            Some(ProjectionSpec::Column(column)) => self.wrapped.is_nullable(column),
            Some(ProjectionSpec::Expression { expression, .. }) => expression
                .columns()
                .iter()
                .any(|c| self.wrapped.is_nullable(c)),
        }
    }

    pub fn is_constant_column(&self, column: &ColumnName) -> bool {
        match self.output_spec(column) {
            None => true,
            Some(ProjectionSpec::Column(column)) => self.wrapped.is_constant_column(column),
            Some(ProjectionSpec::Expression { expression, .. }) => expression
                .columns()
                .iter()
                .all(|c| self.wrapped.is_constant_column(c)),
        }
    }

    /// The unique keys of the wrapped relation that survive the projection.
    pub fn unique_keys(&self) -> Vec<ColumnList> {
        let projected = self
            .projections
            .iter()
            .filter_map(|spec| match spec {
                ProjectionSpec::Column(column) => self.wrapped.resolve_column(column),
                ProjectionSpec::Expression { .. } => None,
            })
            .collect::<BTreeSet<_>>();
        self.wrapped
            .unique_keys()
            .into_iter()
            .filter(|key| key.iter().all(|c| projected.contains(c)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::TableOp;
    use crate::schema::TableName;
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
                )
                .with_column(
                    Identifier::undelimited("title"),
                    GenericType::Character.data_type(),
                    true,
                ),
        )
    }

    fn spec(column: &str) -> ProjectionSpec {
        ProjectionSpec::column(ColumnName::parse(column).unwrap())
    }

    #[test]
    fn test_identity_projection() {
        let all = vec![spec("papers.id"), spec("papers.year"), spec("papers.title")];
        assert_eq!(papers().project(all), papers());
    }

    #[test]
    fn test_nested_projections_intersect() {
        let op = papers()
            .project(vec![spec("papers.id"), spec("papers.year")])
            .project(vec![spec("papers.year")]);
        assert_eq!(op, papers().project(vec![spec("papers.year")]));
    }

    #[test]
    fn test_projection_moves_below_distinct_if_dropped_columns_are_constant() {
        let year = ColumnName::parse("papers.year").unwrap();
        let distinct = papers()
            .select(Expression::column_value(&year, "2002"))
            .project(vec![spec("papers.year"), spec("papers.title")])
            .distinct();
        let op = distinct.project(vec![spec("papers.title")]);
        insta::assert_snapshot!(op, @r"
        Distinct
          Project: papers.title
            Select: Equality(papers.year, Constant(2002@papers.year))
              Table: papers
        ");
    }

    #[test]
    fn test_projection_over_distinct_uses_alias() {
        let distinct = papers()
            .project(vec![spec("papers.year"), spec("papers.title")])
            .distinct();
        let op = distinct.project(vec![spec("papers.title")]);
        let DatabaseOp::Project(project) = &op else {
            panic!("expected a projection");
        };
        let DatabaseOp::Alias(alias) = project.wrapped() else {
            panic!("expected an alias");
        };
        assert!(alias.alias().table().name().starts_with("PROJECT"));
        assert_eq!(
            project.projections(),
            &[ProjectionSpec::column(ColumnName::qualified(
                alias.alias().clone(),
                Identifier::undelimited("title")
            ))]
        );
    }

    #[test]
    fn test_expression_projection() {
        let expression = Expression::concatenation([
            Expression::constant("http://ex.org/", crate::expr::ConstantType::Untyped),
            Expression::column(ColumnName::parse("papers.id").unwrap()),
        ]);
        let spec = ProjectionSpec::expression(expression.clone());
        assert!(spec.column_name().column().name().starts_with("EXPR"));
        assert_eq!(spec, ProjectionSpec::expression(expression));
        let op = papers().project(vec![spec.clone()]);
        assert_eq!(
            op.column_type(spec.column_name()),
            Some(GenericType::Character.data_type())
        );
        assert!(!op.is_nullable(spec.column_name()));
    }
}
