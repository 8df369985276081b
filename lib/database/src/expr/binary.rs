use crate::expr::Expression;
use crate::op::DatabaseOp;
use crate::vendor::Vendor;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinaryOperator {
    Equal,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal | BinaryOperator::Add | BinaryOperator::Multiply
        )
    }

    /// Whether the operator produces a boolean.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::Greater
                | BinaryOperator::GreaterOrEqual
                | BinaryOperator::Less
                | BinaryOperator::LessOrEqual
        )
    }

    pub fn sql_symbol(self) -> &'static str {
        match self {
            BinaryOperator::Equal => "=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        }
    }

    fn name(self) -> &'static str {
        match self {
            BinaryOperator::Equal => "Equality",
            BinaryOperator::Greater => "GreaterThan",
            BinaryOperator::GreaterOrEqual => "GreaterThanOrEqual",
            BinaryOperator::Less => "LessThan",
            BinaryOperator::LessOrEqual => "LessThanOrEqual",
            BinaryOperator::Add => "Add",
            BinaryOperator::Subtract => "Subtract",
            BinaryOperator::Multiply => "Multiply",
            BinaryOperator::Divide => "Divide",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinaryExpression {
    operator: BinaryOperator,
    left: Arc<Expression>,
    right: Arc<Expression>,
}

impl BinaryExpression {
    pub(crate) fn new(operator: BinaryOperator, left: Expression, right: Expression) -> Self {
        Self {
            operator,
            left: Arc::new(left),
            right: Arc::new(right),
        }
    }

    pub fn operator(&self) -> BinaryOperator {
        self.operator
    }

    pub fn left(&self) -> &Expression {
        &self.left
    }

    pub fn right(&self) -> &Expression {
        &self.right
    }

    pub(crate) fn to_sql(&self, context: &DatabaseOp, vendor: Vendor) -> String {
        let left = self.left.to_sql(context, vendor);
        let right = self.right.to_sql(context, vendor);
        if self.operator.is_comparison() {
            format!("{left} {} {right}", self.operator.sql_symbol())
        } else {
            format!("({left} {} {right})", self.operator.sql_symbol())
        }
    }
}

impl Display for BinaryExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}, {})", self.operator.name(), self.left, self.right)
    }
}
