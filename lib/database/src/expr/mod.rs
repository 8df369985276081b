//! Boolean and value expressions over table columns.
//!
//! Expressions are immutable. They are built through the associated constructors of
//! [`Expression`], which fold constants and keep the operands of commutative operators in a
//! canonical order. Two expressions that are logically the same up to operand order therefore
//! compare equal.

mod binary;
mod column_list_equality;
mod constant;
mod sql_fragment;

pub use binary::{BinaryExpression, BinaryOperator};
pub use column_list_equality::ColumnListEquality;
pub use constant::{Constant, ConstantType};
pub use sql_fragment::SqlFragment;

use crate::op::DatabaseOp;
use crate::renamer::Renamer;
use crate::schema::{ColumnList, ColumnName};
use crate::types::{DataType, GenericType};
use crate::vendor::Vendor;
use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Expression {
    True,
    False,
    Column(ColumnName),
    Constant(Constant),
    Binary(BinaryExpression),
    Negation(Arc<Expression>),
    UnaryMinus(Arc<Expression>),
    /// Sorted and free of duplicates. Has at least two operands.
    Conjunction(Vec<Expression>),
    /// Sorted and free of duplicates. Has at least two operands.
    Disjunction(Vec<Expression>),
    Concatenation(Vec<Expression>),
    ColumnListEquality(ColumnListEquality),
    SqlFragment(SqlFragment),
    /// Turns a boolean expression into `1` or `0`.
    BooleanToInteger(Arc<Expression>),
}

impl Expression {
    pub fn column(column: ColumnName) -> Self {
        Expression::Column(column)
    }

    pub fn constant(value: impl Into<String>, kind: ConstantType) -> Self {
        Expression::Constant(Constant::new(value, kind))
    }

    /// A constant that is rendered with the type of `column`.
    pub fn constant_for_column(value: impl Into<String>, column: &ColumnName) -> Self {
        Self::constant(value, ConstantType::Column(column.clone()))
    }

    pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Self {
        if operator == BinaryOperator::Equal && left == right {
            return Expression::True;
        }
        let (left, right) = if operator.is_commutative() && right < left {
            (right, left)
        } else {
            (left, right)
        };
        Expression::Binary(BinaryExpression::new(operator, left, right))
    }

    pub fn equal(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOperator::Equal, left, right)
    }

    pub fn greater(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOperator::Greater, left, right)
    }

    pub fn greater_or_equal(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOperator::GreaterOrEqual, left, right)
    }

    pub fn less(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOperator::Less, left, right)
    }

    pub fn less_or_equal(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOperator::LessOrEqual, left, right)
    }

    pub fn column_equality(left: &ColumnName, right: &ColumnName) -> Self {
        Self::equal(Self::column(left.clone()), Self::column(right.clone()))
    }

    /// `column = 'value'`, with the constant typed like the column.
    pub fn column_value(column: &ColumnName, value: impl Into<String>) -> Self {
        Self::equal(
            Self::column(column.clone()),
            Self::constant_for_column(value, column),
        )
    }

    pub fn column_list_equality(left: ColumnList, right: ColumnList) -> Self {
        Expression::ColumnListEquality(ColumnListEquality::new(left, right))
    }

    pub fn not(expression: Expression) -> Self {
        match expression {
            Expression::True => Expression::False,
            Expression::False => Expression::True,
            Expression::Negation(inner) => Arc::unwrap_or_clone(inner),
            other => Expression::Negation(Arc::new(other)),
        }
    }

    pub fn unary_minus(expression: Expression) -> Self {
        match expression {
            Expression::UnaryMinus(inner) => Arc::unwrap_or_clone(inner),
            other => Expression::UnaryMinus(Arc::new(other)),
        }
    }

    /// Builds the conjunction of `operands`. `FALSE` absorbs, `TRUE` is dropped and nested
    /// conjunctions are flattened.
    pub fn conjunction(operands: impl IntoIterator<Item = Expression>) -> Self {
        let mut result = BTreeSet::new();
        for operand in operands {
            match operand {
                Expression::True => {}
                Expression::False => return Expression::False,
                Expression::Conjunction(inner) => result.extend(inner),
                other => {
                    result.insert(other);
                }
            }
        }
        if result.len() > 1 {
            return Expression::Conjunction(result.into_iter().collect());
        }
        result.pop_first().unwrap_or(Expression::True)
    }

    /// Builds the disjunction of `operands`. `TRUE` absorbs, `FALSE` is dropped and nested
    /// disjunctions are flattened.
    pub fn disjunction(operands: impl IntoIterator<Item = Expression>) -> Self {
        let mut result = BTreeSet::new();
        for operand in operands {
            match operand {
                Expression::False => {}
                Expression::True => return Expression::True,
                Expression::Disjunction(inner) => result.extend(inner),
                other => {
                    result.insert(other);
                }
            }
        }
        if result.len() > 1 {
            return Expression::Disjunction(result.into_iter().collect());
        }
        result.pop_first().unwrap_or(Expression::False)
    }

    /// String concatenation. Empty string constants are dropped.
    pub fn concatenation(parts: impl IntoIterator<Item = Expression>) -> Self {
        let mut result = Vec::new();
        for part in parts {
            match part {
                Expression::Concatenation(inner) => result.extend(inner),
                Expression::Constant(constant) if constant.value().is_empty() => {}
                other => result.push(other),
            }
        }
        if result.len() > 1 {
            return Expression::Concatenation(result);
        }
        result
            .pop()
            .unwrap_or_else(|| Self::constant("", ConstantType::Untyped))
    }

    /// Parses a raw SQL expression. See [`SqlFragment::parse`].
    pub fn sql_fragment(sql: &str) -> Self {
        SqlFragment::parse(sql, None)
    }

    pub fn boolean_to_integer(expression: Expression) -> Self {
        match expression {
            Expression::True => Self::constant("1", ConstantType::Generic(GenericType::Numeric)),
            Expression::False => Self::constant("0", ConstantType::Generic(GenericType::Numeric)),
            other => Expression::BooleanToInteger(Arc::new(other)),
        }
    }

    #[must_use]
    pub fn and(self, other: Expression) -> Self {
        Self::conjunction([self, other])
    }

    #[must_use]
    pub fn or(self, other: Expression) -> Self {
        Self::disjunction([self, other])
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Expression::True)
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Expression::False)
    }

    /// An expression without column references.
    pub fn is_constant(&self) -> bool {
        self.columns().is_empty()
    }

    pub fn columns(&self) -> BTreeSet<ColumnName> {
        let mut result = BTreeSet::new();
        self.collect_columns(&mut result);
        result
    }

    fn collect_columns(&self, result: &mut BTreeSet<ColumnName>) {
        match self {
            Expression::True | Expression::False | Expression::Constant(_) => {}
            Expression::Column(column) => {
                result.insert(column.clone());
            }
            Expression::Binary(binary) => {
                binary.left().collect_columns(result);
                binary.right().collect_columns(result);
            }
            Expression::Negation(inner)
            | Expression::UnaryMinus(inner)
            | Expression::BooleanToInteger(inner) => inner.collect_columns(result),
            Expression::Conjunction(operands)
            | Expression::Disjunction(operands)
            | Expression::Concatenation(operands) => {
                for operand in operands {
                    operand.collect_columns(result);
                }
            }
            Expression::ColumnListEquality(equality) => {
                result.extend(equality.left().iter().cloned());
                result.extend(equality.right().iter().cloned());
            }
            Expression::SqlFragment(fragment) => result.extend(fragment.columns().iter().cloned()),
        }
    }

    /// Checks whether this condition, if it holds, forces `column` to a single value.
    pub fn forces_constant_column(&self, column: &ColumnName) -> bool {
        match self {
            Expression::Conjunction(operands) => operands
                .iter()
                .any(|operand| operand.forces_constant_column(column)),
            Expression::Binary(binary) if binary.operator() == BinaryOperator::Equal => {
                let is_column = |e: &Expression| matches!(e, Expression::Column(c) if c == column);
                (is_column(binary.left()) && binary.right().is_constant_value())
                    || (is_column(binary.right()) && binary.left().is_constant_value())
            }
            _ => false,
        }
    }

    fn is_constant_value(&self) -> bool {
        match self {
            Expression::Constant(_) => true,
            Expression::Column(_) => false,
            other => other.is_constant(),
        }
    }

    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> Expression {
        match self {
            Expression::True | Expression::False => self.clone(),
            Expression::Column(column) => Expression::Column(renamer.apply_to_column(column)),
            Expression::Constant(constant) => Expression::Constant(constant.rename(renamer)),
            Expression::Binary(binary) => Self::binary(
                binary.operator(),
                binary.left().rename(renamer),
                binary.right().rename(renamer),
            ),
            Expression::Negation(inner) => Self::not(inner.rename(renamer)),
            Expression::UnaryMinus(inner) => Self::unary_minus(inner.rename(renamer)),
            Expression::BooleanToInteger(inner) => Self::boolean_to_integer(inner.rename(renamer)),
            Expression::Conjunction(operands) => {
                Self::conjunction(operands.iter().map(|e| e.rename(renamer)))
            }
            Expression::Disjunction(operands) => {
                Self::disjunction(operands.iter().map(|e| e.rename(renamer)))
            }
            Expression::Concatenation(parts) => {
                Self::concatenation(parts.iter().map(|e| e.rename(renamer)))
            }
            Expression::ColumnListEquality(equality) => {
                Expression::ColumnListEquality(equality.rename(renamer))
            }
            Expression::SqlFragment(fragment) => Expression::SqlFragment(fragment.rename(renamer)),
        }
    }

    /// The SQL type of the value of this expression within `context`.
    pub fn data_type(&self, context: &DatabaseOp) -> Option<DataType> {
        match self {
            Expression::True
            | Expression::False
            | Expression::Negation(_)
            | Expression::Conjunction(_)
            | Expression::Disjunction(_)
            | Expression::ColumnListEquality(_) => Some(GenericType::Boolean.data_type()),
            Expression::Binary(binary) if binary.operator().is_comparison() => {
                Some(GenericType::Boolean.data_type())
            }
            Expression::Binary(_) | Expression::UnaryMinus(_) | Expression::BooleanToInteger(_) => {
                Some(GenericType::Numeric.data_type())
            }
            Expression::Column(column) => context.column_type(column),
            Expression::Constant(constant) => constant.data_type(context),
            Expression::Concatenation(_) => Some(GenericType::Character.data_type()),
            Expression::SqlFragment(fragment) => {
                fragment.generic_type().map(GenericType::data_type)
            }
        }
    }

    /// Renders this expression as SQL. Column types are looked up in `context`.
    pub fn to_sql(&self, context: &DatabaseOp, vendor: Vendor) -> String {
        match self {
            Expression::True => "1=1".to_owned(),
            Expression::False => "1=0".to_owned(),
            Expression::Column(column) => vendor.quote_column_name(column),
            Expression::Constant(constant) => constant.to_sql(context, vendor),
            Expression::Binary(binary) => binary.to_sql(context, vendor),
            Expression::Negation(inner) => format!("NOT ({})", inner.to_sql(context, vendor)),
            Expression::UnaryMinus(inner) => format!("-({})", inner.to_sql(context, vendor)),
            Expression::Conjunction(operands) => format!(
                "({})",
                operands
                    .iter()
                    .map(|e| e.to_sql(context, vendor))
                    .join(" AND ")
            ),
            Expression::Disjunction(operands) => format!(
                "({})",
                operands
                    .iter()
                    .map(|e| e.to_sql(context, vendor))
                    .join(" OR ")
            ),
            Expression::Concatenation(parts) => {
                let parts = parts
                    .iter()
                    .map(|e| e.to_sql(context, vendor))
                    .collect::<Vec<_>>();
                vendor.concatenate(&parts)
            }
            Expression::ColumnListEquality(equality) => equality.to_sql(vendor),
            Expression::SqlFragment(fragment) => fragment.to_sql(vendor),
            Expression::BooleanToInteger(inner) => format!(
                "(CASE WHEN {} THEN 1 ELSE 0 END)",
                inner.to_sql(context, vendor)
            ),
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::True => f.write_str("TRUE"),
            Expression::False => f.write_str("FALSE"),
            Expression::Column(column) => write!(f, "{column}"),
            Expression::Constant(constant) => write!(f, "{constant}"),
            Expression::Binary(binary) => write!(f, "{binary}"),
            Expression::Negation(inner) => write!(f, "Negation({inner})"),
            Expression::UnaryMinus(inner) => write!(f, "UnaryMinus({inner})"),
            Expression::Conjunction(operands) => {
                write!(f, "Conjunction({})", operands.iter().join(", "))
            }
            Expression::Disjunction(operands) => {
                write!(f, "Disjunction({})", operands.iter().join(", "))
            }
            Expression::Concatenation(parts) => {
                write!(f, "Concatenation({})", parts.iter().join(", "))
            }
            Expression::ColumnListEquality(equality) => write!(f, "{equality}"),
            Expression::SqlFragment(fragment) => write!(f, "{fragment}"),
            Expression::BooleanToInteger(inner) => write!(f, "BooleanToInteger({inner})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Expression {
        Expression::column(ColumnName::parse(name).unwrap())
    }

    #[test]
    fn test_boolean_identities() {
        let a = Expression::column_value(&ColumnName::parse("t.a").unwrap(), "1");
        assert_eq!(a.clone().and(Expression::True), a);
        assert_eq!(a.clone().and(Expression::False), Expression::False);
        assert_eq!(a.clone().or(Expression::False), a);
        assert_eq!(a.clone().or(Expression::True), Expression::True);
        assert_eq!(Expression::not(Expression::not(a.clone())), a);
        assert_eq!(Expression::not(Expression::True), Expression::False);
    }

    #[test]
    fn test_conjunction_is_canonical() {
        let a = Expression::equal(col("t.a"), col("t.b"));
        let b = Expression::greater(col("t.c"), col("t.d"));
        let c = Expression::less(col("t.e"), col("t.f"));
        let left = Expression::conjunction([a.clone(), b.clone().and(c.clone())]);
        let right = Expression::conjunction([c, a.clone(), b, a]);
        assert_eq!(left, right);
        insta::assert_snapshot!(
            left,
            @"Conjunction(Equality(t.a, t.b), GreaterThan(t.c, t.d), LessThan(t.e, t.f))"
        );
    }

    #[test]
    fn test_equality_is_symmetric() {
        assert_eq!(
            Expression::equal(col("t.a"), col("s.b")),
            Expression::equal(col("s.b"), col("t.a"))
        );
        assert_ne!(
            Expression::greater(col("t.a"), col("s.b")),
            Expression::greater(col("s.b"), col("t.a"))
        );
        assert_eq!(Expression::equal(col("t.a"), col("t.a")), Expression::True);
    }

    #[test]
    fn test_concatenation_flattens() {
        let inner = Expression::concatenation([
            Expression::constant("http://ex.org/", ConstantType::Untyped),
            col("t.id"),
        ]);
        let outer = Expression::concatenation([
            inner,
            Expression::constant("", ConstantType::Untyped),
            Expression::constant("/x", ConstantType::Untyped),
        ]);
        insta::assert_snapshot!(
            outer,
            @"Concatenation(Constant(http://ex.org/), t.id, Constant(/x))"
        );
    }

    #[test]
    fn test_rename_round_trip() {
        let renamer = Renamer::for_tables([(
            crate::schema::TableName::parse("t").unwrap(),
            crate::schema::TableName::parse("z").unwrap(),
        )]);
        let expression = Expression::conjunction([
            Expression::column_value(&ColumnName::parse("t.a").unwrap(), "5"),
            Expression::equal(col("t.b"), col("s.c")),
            Expression::not(Expression::less(col("t.d"), col("u.e"))),
        ]);
        let renamed = expression.rename(&renamer);
        assert!(renamed
            .columns()
            .iter()
            .all(|c| c.qualifier().unwrap().to_string() != "t"));
        assert_eq!(renamed.rename(&renamer.inverse()), expression);
    }

    #[test]
    fn test_forces_constant_column() {
        let column = ColumnName::parse("t.a").unwrap();
        let condition = Expression::column_value(&column, "5").and(Expression::equal(
            col("t.b"),
            col("t.c"),
        ));
        assert!(condition.forces_constant_column(&column));
        assert!(!condition.forces_constant_column(&ColumnName::parse("t.b").unwrap()));
    }
}
