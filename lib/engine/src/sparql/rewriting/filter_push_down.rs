use crate::sparql::op::expression_variables;
use crate::sparql::SparqlOp;
use rdb2rdf_common::{CompilationError, CompileResult};
use rdb2rdf_model::{Expression, Variable};
use std::collections::BTreeSet;
use tracing::trace;

/// Moves filter expressions as close as possible to the operators that produce their
/// variables.
///
/// Expressions end up directly above basic graph patterns and other leaves where possible. This
/// allows the assembler to translate them into SQL. Expressions are never moved past operators
/// that change the variables in scope, such as projections or groupings.
///
/// Returns [`CompilationError::UnbalancedPushDown`] if an expression got lost on the way.
pub fn push_down_filters(op: SparqlOp) -> CompileResult<SparqlOp> {
    let mut before = Vec::new();
    collect_filter_expressions(&op, &mut before);
    let result = push_down(op, Vec::new());
    let mut after = Vec::new();
    collect_filter_expressions(&result, &mut after);
    if let Some(lost) = before.iter().find(|e| !after.contains(e)) {
        return Err(CompilationError::UnbalancedPushDown(format!(
            "the expression {lost} is missing after the push-down"
        )));
    }
    Ok(result)
}

fn push_down(op: SparqlOp, pending: Vec<Expression>) -> SparqlOp {
    match op {
        SparqlOp::Filter { expressions, inner } => {
            let mut pending = pending;
            for expression in expressions {
                if !pending.contains(&expression) {
                    pending.push(expression);
                }
            }
            push_down(*inner, pending)
        }
        SparqlOp::Bgp { .. }
        | SparqlOp::Path { .. }
        | SparqlOp::Values { .. }
        | SparqlOp::Service { .. }
        | SparqlOp::Sql(_)
        | SparqlOp::Empty { .. } => SparqlOp::filter(op, pending),
        SparqlOp::Label { label, inner } => SparqlOp::label(label, push_down(*inner, pending)),
        SparqlOp::Union { left, right } => {
            let (left, right, retained) = push_into_both(*left, *right, pending, false);
            SparqlOp::filter(SparqlOp::union(left, right), retained)
        }
        SparqlOp::Join { left, right } => {
            let (left, right, retained) = push_into_both(*left, *right, pending, false);
            SparqlOp::filter(SparqlOp::join(left, right), retained)
        }
        SparqlOp::LeftJoin {
            left,
            right,
            expression,
        } => {
            let (left, right, retained) = push_into_both(*left, *right, pending, true);
            SparqlOp::filter(
                SparqlOp::LeftJoin {
                    left: Box::new(left),
                    right: Box::new(right),
                    expression,
                },
                retained,
            )
        }
        SparqlOp::Minus { left, right } => SparqlOp::Minus {
            left: Box::new(push_down(*left, pending)),
            right: Box::new(push_down(*right, Vec::new())),
        },
        op => {
            let op = push_into_children(op);
            if !pending.is_empty() {
                trace!("Keeping {} filter expression(s) above {op}", pending.len());
            }
            SparqlOp::filter(op, pending)
        }
    }
}

/// Pushes the expressions that only use variables of a side into that side.
///
/// Returns the rewritten sides and the expressions that could not be pushed into any side. If
/// `optional_right` is set, expressions are only pushed to the right if they can also be pushed
/// to the left.
fn push_into_both(
    left: SparqlOp,
    right: SparqlOp,
    pending: Vec<Expression>,
    optional_right: bool,
) -> (SparqlOp, SparqlOp, Vec<Expression>) {
    let left_variables = left.mentioned_variables();
    let right_variables = right.mentioned_variables();
    let mut to_left = Vec::new();
    let mut to_right = Vec::new();
    let mut retained = Vec::new();
    for expression in pending {
        let in_left = is_covered(&expression, &left_variables);
        let in_right = is_covered(&expression, &right_variables) && (!optional_right || in_left);
        if in_left {
            to_left.push(expression.clone());
        }
        if in_right {
            to_right.push(expression.clone());
        }
        if !in_left && !in_right {
            retained.push(expression);
        }
    }
    (
        push_down(left, to_left),
        push_down(right, to_right),
        retained,
    )
}

fn is_covered(expression: &Expression, variables: &BTreeSet<Variable>) -> bool {
    expression_variables(expression).is_subset(variables)
}

/// Rewrites the children of an operator that filters cannot be moved past.
fn push_into_children(op: SparqlOp) -> SparqlOp {
    let rewrite = |inner: Box<SparqlOp>| Box::new(push_down(*inner, Vec::new()));
    match op {
        SparqlOp::Graph { name, inner } => SparqlOp::Graph {
            name,
            inner: rewrite(inner),
        },
        SparqlOp::Extend {
            inner,
            variable,
            expression,
        } => SparqlOp::Extend {
            inner: rewrite(inner),
            variable,
            expression,
        },
        SparqlOp::OrderBy { inner, expression } => SparqlOp::OrderBy {
            inner: rewrite(inner),
            expression,
        },
        SparqlOp::Project { inner, variables } => SparqlOp::Project {
            inner: rewrite(inner),
            variables,
        },
        SparqlOp::Distinct { inner } => SparqlOp::Distinct {
            inner: rewrite(inner),
        },
        SparqlOp::Reduced { inner } => SparqlOp::Reduced {
            inner: rewrite(inner),
        },
        SparqlOp::Slice {
            inner,
            start,
            length,
        } => SparqlOp::Slice {
            inner: rewrite(inner),
            start,
            length,
        },
        SparqlOp::Group {
            inner,
            variables,
            aggregates,
        } => SparqlOp::Group {
            inner: rewrite(inner),
            variables,
            aggregates,
        },
        op => op,
    }
}

fn collect_filter_expressions(op: &SparqlOp, result: &mut Vec<Expression>) {
    if let SparqlOp::Filter { expressions, .. } = op {
        result.extend(expressions.iter().cloned());
    }
    for child in op.children() {
        collect_filter_expressions(child, result);
    }
}
