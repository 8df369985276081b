use crate::expr::Expression;
use crate::op::DatabaseOp;
use std::sync::Arc;

/// Keeps the rows of the wrapped relation for which the condition holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectOp {
    wrapped: Arc<DatabaseOp>,
    condition: Expression,
}

impl SelectOp {
    pub fn select(op: DatabaseOp, condition: Expression) -> DatabaseOp {
        if condition.is_true() {
            return op;
        }
        if condition.is_false() {
            return op.empty();
        }
        match op {
            DatabaseOp::Empty(_) => op,
            DatabaseOp::Select(inner) => {
                let merged = inner.condition.clone().and(condition);
                SelectOp::select(Arc::unwrap_or_clone(inner.wrapped), merged)
            }
            op => DatabaseOp::Select(SelectOp {
                wrapped: Arc::new(op),
                condition,
            }),
        }
    }

    pub fn wrapped(&self) -> &DatabaseOp {
        &self.wrapped
    }

    pub fn condition(&self) -> &Expression {
        &self.condition
    }
}
