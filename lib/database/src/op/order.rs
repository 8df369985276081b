use crate::expr::Expression;
use crate::op::DatabaseOp;
use crate::renamer::Renamer;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderSpec {
    expression: Expression,
    ascending: bool,
}

impl OrderSpec {
    pub fn ascending(expression: Expression) -> Self {
        Self {
            expression,
            ascending: true,
        }
    }

    pub fn descending(expression: Expression) -> Self {
        Self {
            expression,
            ascending: false,
        }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> OrderSpec {
        OrderSpec {
            expression: self.expression.rename(renamer),
            ascending: self.ascending,
        }
    }
}

impl Display for OrderSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.ascending {
            write!(f, "{}", self.expression)
        } else {
            write!(f, "{} DESC", self.expression)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderOp {
    wrapped: Arc<DatabaseOp>,
    order_by: Vec<OrderSpec>,
}

impl OrderOp {
    /// Orders the wrapped relation. Ordering an ordered relation uses the new order first and
    /// the previous one to break ties.
    pub fn order(op: DatabaseOp, order_by: Vec<OrderSpec>) -> DatabaseOp {
        if order_by.is_empty() {
            return op;
        }
        match op {
            DatabaseOp::Empty(_) => op,
            DatabaseOp::Order(inner) => {
                let mut merged = order_by;
                for spec in &inner.order_by {
                    if !merged.contains(spec) {
                        merged.push(spec.clone());
                    }
                }
                DatabaseOp::Order(OrderOp {
                    wrapped: inner.wrapped,
                    order_by: merged,
                })
            }
            op => DatabaseOp::Order(OrderOp {
                wrapped: Arc::new(op),
                order_by,
            }),
        }
    }

    pub fn wrapped(&self) -> &DatabaseOp {
        &self.wrapped
    }

    pub fn order_by(&self) -> &[OrderSpec] {
        &self.order_by
    }
}
