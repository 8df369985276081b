use crate::sparql::SqlUnion;
use rdb2rdf_model::{
    is_blank_node_variable, pattern_variables, term_pattern_variable, AggregateExpression,
    Expression, GraphPattern, GroundTerm, NamedNodePattern, OrderExpression,
    PropertyPathExpression, TermPattern, TriplePattern, Variable,
};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// A SPARQL algebra operator.
///
/// In addition to the operators of the SPARQL algebra, the tree can contain operators that are
/// backed by SQL statements ([`SparqlOp::Sql`]) and operators that are known to produce no
/// solutions ([`SparqlOp::Empty`]). Filters keep a list of expressions so that they can be
/// pushed down independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SparqlOp {
    Bgp {
        patterns: Vec<TriplePattern>,
    },
    Path {
        subject: TermPattern,
        path: PropertyPathExpression,
        object: TermPattern,
    },
    Values {
        variables: Vec<Variable>,
        bindings: Vec<Vec<Option<GroundTerm>>>,
    },
    Filter {
        expressions: Vec<Expression>,
        inner: Box<SparqlOp>,
    },
    Join {
        left: Box<SparqlOp>,
        right: Box<SparqlOp>,
    },
    LeftJoin {
        left: Box<SparqlOp>,
        right: Box<SparqlOp>,
        expression: Option<Expression>,
    },
    Union {
        left: Box<SparqlOp>,
        right: Box<SparqlOp>,
    },
    Minus {
        left: Box<SparqlOp>,
        right: Box<SparqlOp>,
    },
    Graph {
        name: NamedNodePattern,
        inner: Box<SparqlOp>,
    },
    Service {
        name: NamedNodePattern,
        inner: Box<SparqlOp>,
        silent: bool,
    },
    Extend {
        inner: Box<SparqlOp>,
        variable: Variable,
        expression: Expression,
    },
    OrderBy {
        inner: Box<SparqlOp>,
        expression: Vec<OrderExpression>,
    },
    Project {
        inner: Box<SparqlOp>,
        variables: Vec<Variable>,
    },
    Distinct {
        inner: Box<SparqlOp>,
    },
    Reduced {
        inner: Box<SparqlOp>,
    },
    Slice {
        inner: Box<SparqlOp>,
        start: usize,
        length: Option<usize>,
    },
    Group {
        inner: Box<SparqlOp>,
        variables: Vec<Variable>,
        aggregates: Vec<(Variable, AggregateExpression)>,
    },
    /// Names a sub-tree. Labels do not change the solutions.
    Label {
        label: String,
        inner: Box<SparqlOp>,
    },
    /// A union of SQL statements that produces the solutions of a basic graph pattern.
    Sql(SqlUnion),
    /// Produces no solutions.
    Empty {
        variables: Vec<Variable>,
    },
}

impl SparqlOp {
    pub fn filter(inner: SparqlOp, expressions: Vec<Expression>) -> SparqlOp {
        if expressions.is_empty() {
            return inner;
        }
        SparqlOp::Filter {
            expressions,
            inner: Box::new(inner),
        }
    }

    pub fn join(left: SparqlOp, right: SparqlOp) -> SparqlOp {
        SparqlOp::Join {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn union(left: SparqlOp, right: SparqlOp) -> SparqlOp {
        SparqlOp::Union {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn label(label: impl Into<String>, inner: SparqlOp) -> SparqlOp {
        SparqlOp::Label {
            label: label.into(),
            inner: Box::new(inner),
        }
    }

    /// Returns whether the operator is a filter-free basic graph pattern.
    pub fn is_bgp(&self) -> bool {
        matches!(self, SparqlOp::Bgp { .. })
    }

    /// The variables mentioned by the operator and its children.
    ///
    /// Only the operators that bind variables contribute. Projections, for example, do not add
    /// the projected variables.
    pub fn mentioned_variables(&self) -> BTreeSet<Variable> {
        let mut variables = BTreeSet::new();
        self.collect_variables(&mut variables);
        variables
    }

    fn collect_variables(&self, variables: &mut BTreeSet<Variable>) {
        match self {
            SparqlOp::Bgp { patterns } => {
                variables.extend(patterns.iter().flat_map(pattern_variables));
            }
            SparqlOp::Path {
                subject, object, ..
            } => {
                variables.extend(term_pattern_variable(subject));
                variables.extend(term_pattern_variable(object));
            }
            SparqlOp::Values {
                variables: bound, ..
            } => variables.extend(bound.iter().cloned()),
            SparqlOp::Filter { inner, .. }
            | SparqlOp::OrderBy { inner, .. }
            | SparqlOp::Project { inner, .. }
            | SparqlOp::Distinct { inner }
            | SparqlOp::Reduced { inner }
            | SparqlOp::Slice { inner, .. }
            | SparqlOp::Service { inner, .. }
            | SparqlOp::Label { inner, .. } => inner.collect_variables(variables),
            SparqlOp::Join { left, right }
            | SparqlOp::LeftJoin { left, right, .. }
            | SparqlOp::Union { left, right }
            | SparqlOp::Minus { left, right } => {
                left.collect_variables(variables);
                right.collect_variables(variables);
            }
            SparqlOp::Graph { name, inner } => {
                if let NamedNodePattern::Variable(variable) = name {
                    variables.insert(variable.clone());
                }
                inner.collect_variables(variables);
            }
            SparqlOp::Extend {
                inner, variable, ..
            } => {
                variables.insert(variable.clone());
                inner.collect_variables(variables);
            }
            SparqlOp::Group {
                inner, aggregates, ..
            } => {
                variables.extend(aggregates.iter().map(|(variable, _)| variable.clone()));
                inner.collect_variables(variables);
            }
            SparqlOp::Sql(union) => variables.extend(union.variables()),
            SparqlOp::Empty { variables: bound } => variables.extend(bound.iter().cloned()),
        }
    }

    fn fmt_indented(&self, f: &mut Formatter<'_>, indent: usize) -> std::fmt::Result {
        write!(f, "{:indent$}", "")?;
        match self {
            SparqlOp::Bgp { patterns } => {
                writeln!(f, "Bgp")?;
                for pattern in patterns {
                    writeln!(
                        f,
                        "{:width$}{} {} {}",
                        "",
                        pattern.subject,
                        pattern.predicate,
                        pattern.object,
                        width = indent + 2
                    )?;
                }
                return Ok(());
            }
            SparqlOp::Path {
                subject,
                path,
                object,
            } => return writeln!(f, "Path: {subject} {path} {object}"),
            SparqlOp::Values { variables, bindings } => {
                write!(f, "Values:")?;
                for variable in variables {
                    write!(f, " {variable}")?;
                }
                return writeln!(f, " ({} rows)", bindings.len());
            }
            SparqlOp::Filter { expressions, .. } => {
                write!(f, "Filter:")?;
                for (i, expression) in expressions.iter().enumerate() {
                    let separator = if i == 0 { " " } else { ", " };
                    write!(f, "{separator}{expression}")?;
                }
                writeln!(f)?;
            }
            SparqlOp::Join { .. } => writeln!(f, "Join")?,
            SparqlOp::LeftJoin { expression, .. } => match expression {
                Some(expression) => writeln!(f, "LeftJoin: {expression}")?,
                None => writeln!(f, "LeftJoin")?,
            },
            SparqlOp::Union { .. } => writeln!(f, "Union")?,
            SparqlOp::Minus { .. } => writeln!(f, "Minus")?,
            SparqlOp::Graph { name, .. } => writeln!(f, "Graph: {name}")?,
            SparqlOp::Service { name, silent, .. } => {
                let silent = if *silent { " SILENT" } else { "" };
                writeln!(f, "Service{silent}: {name}")?;
            }
            SparqlOp::Extend {
                variable,
                expression,
                ..
            } => writeln!(f, "Extend: {variable} := {expression}")?,
            SparqlOp::OrderBy { expression, .. } => {
                write!(f, "OrderBy:")?;
                for expression in expression {
                    write!(f, " {expression}")?;
                }
                writeln!(f)?;
            }
            SparqlOp::Project { variables, .. } => {
                write!(f, "Project:")?;
                for variable in variables {
                    write!(f, " {variable}")?;
                }
                writeln!(f)?;
            }
            SparqlOp::Distinct { .. } => writeln!(f, "Distinct")?,
            SparqlOp::Reduced { .. } => writeln!(f, "Reduced")?,
            SparqlOp::Slice { start, length, .. } => match length {
                Some(length) => writeln!(f, "Slice: {start}..{}", start + length)?,
                None => writeln!(f, "Slice: {start}..")?,
            },
            SparqlOp::Group {
                variables,
                aggregates,
                ..
            } => {
                write!(f, "Group:")?;
                for variable in variables {
                    write!(f, " {variable}")?;
                }
                for (variable, aggregate) in aggregates {
                    write!(f, " ({aggregate} AS {variable})")?;
                }
                writeln!(f)?;
            }
            SparqlOp::Label { label, .. } => writeln!(f, "Label: {label}")?,
            SparqlOp::Sql(union) => {
                writeln!(f, "Sql: {} statement(s)", union.groups().len())?;
                return Ok(());
            }
            SparqlOp::Empty { variables } => {
                write!(f, "Empty:")?;
                for variable in variables {
                    write!(f, " {variable}")?;
                }
                return writeln!(f);
            }
        }
        for child in self.children() {
            child.fmt_indented(f, indent + 2)?;
        }
        Ok(())
    }

    /// The direct inputs of the operator.
    pub fn children(&self) -> Vec<&SparqlOp> {
        match self {
            SparqlOp::Bgp { .. }
            | SparqlOp::Path { .. }
            | SparqlOp::Values { .. }
            | SparqlOp::Sql(_)
            | SparqlOp::Empty { .. } => Vec::new(),
            SparqlOp::Filter { inner, .. }
            | SparqlOp::Graph { inner, .. }
            | SparqlOp::Service { inner, .. }
            | SparqlOp::Extend { inner, .. }
            | SparqlOp::OrderBy { inner, .. }
            | SparqlOp::Project { inner, .. }
            | SparqlOp::Distinct { inner }
            | SparqlOp::Reduced { inner }
            | SparqlOp::Slice { inner, .. }
            | SparqlOp::Group { inner, .. }
            | SparqlOp::Label { inner, .. } => vec![inner],
            SparqlOp::Join { left, right }
            | SparqlOp::LeftJoin { left, right, .. }
            | SparqlOp::Union { left, right }
            | SparqlOp::Minus { left, right } => vec![left, right],
        }
    }
}

impl From<&GraphPattern> for SparqlOp {
    fn from(pattern: &GraphPattern) -> Self {
        let boxed = |pattern: &GraphPattern| Box::new(SparqlOp::from(pattern));
        match pattern {
            GraphPattern::Bgp { patterns } => SparqlOp::Bgp {
                patterns: patterns.clone(),
            },
            GraphPattern::Path {
                subject,
                path,
                object,
            } => SparqlOp::Path {
                subject: subject.clone(),
                path: path.clone(),
                object: object.clone(),
            },
            GraphPattern::Values {
                variables,
                bindings,
            } => SparqlOp::Values {
                variables: variables.clone(),
                bindings: bindings.clone(),
            },
            GraphPattern::Filter { expr, inner } => {
                let mut expressions = Vec::new();
                split_conjunction(expr, &mut expressions);
                SparqlOp::Filter {
                    expressions,
                    inner: boxed(inner),
                }
            }
            GraphPattern::Join { left, right } => SparqlOp::Join {
                left: boxed(left),
                right: boxed(right),
            },
            GraphPattern::LeftJoin {
                left,
                right,
                expression,
            } => SparqlOp::LeftJoin {
                left: boxed(left),
                right: boxed(right),
                expression: expression.clone(),
            },
            GraphPattern::Union { left, right } => SparqlOp::Union {
                left: boxed(left),
                right: boxed(right),
            },
            GraphPattern::Minus { left, right } => SparqlOp::Minus {
                left: boxed(left),
                right: boxed(right),
            },
            GraphPattern::Graph { name, inner } => SparqlOp::Graph {
                name: name.clone(),
                inner: boxed(inner),
            },
            GraphPattern::Service {
                name,
                inner,
                silent,
            } => SparqlOp::Service {
                name: name.clone(),
                inner: boxed(inner),
                silent: *silent,
            },
            GraphPattern::Extend {
                inner,
                variable,
                expression,
            } => SparqlOp::Extend {
                inner: boxed(inner),
                variable: variable.clone(),
                expression: expression.clone(),
            },
            GraphPattern::OrderBy { inner, expression } => SparqlOp::OrderBy {
                inner: boxed(inner),
                expression: expression.clone(),
            },
            GraphPattern::Project { inner, variables } => SparqlOp::Project {
                inner: boxed(inner),
                variables: variables.clone(),
            },
            GraphPattern::Distinct { inner } => SparqlOp::Distinct {
                inner: boxed(inner),
            },
            GraphPattern::Reduced { inner } => SparqlOp::Reduced {
                inner: boxed(inner),
            },
            GraphPattern::Slice {
                inner,
                start,
                length,
            } => SparqlOp::Slice {
                inner: boxed(inner),
                start: *start,
                length: *length,
            },
            GraphPattern::Group {
                inner,
                variables,
                aggregates,
            } => SparqlOp::Group {
                inner: boxed(inner),
                variables: variables.clone(),
                aggregates: aggregates.clone(),
            },
        }
    }
}

/// Splits a filter condition into its conjuncts so that they can be moved independently.
fn split_conjunction(expression: &Expression, result: &mut Vec<Expression>) {
    if let Expression::And(left, right) = expression {
        split_conjunction(left, result);
        split_conjunction(right, result);
    } else if !result.contains(expression) {
        result.push(expression.clone());
    }
}

/// The variables an expression mentions. Variables of nested `EXISTS` patterns are included.
pub fn expression_variables(expression: &Expression) -> BTreeSet<Variable> {
    let mut variables = BTreeSet::new();
    collect_expression_variables(expression, &mut variables);
    variables
}

fn collect_expression_variables(expression: &Expression, variables: &mut BTreeSet<Variable>) {
    match expression {
        Expression::NamedNode(_) | Expression::Literal(_) => {}
        Expression::Variable(variable) | Expression::Bound(variable) => {
            variables.insert(variable.clone());
        }
        Expression::Or(left, right)
        | Expression::And(left, right)
        | Expression::Equal(left, right)
        | Expression::SameTerm(left, right)
        | Expression::Greater(left, right)
        | Expression::GreaterOrEqual(left, right)
        | Expression::Less(left, right)
        | Expression::LessOrEqual(left, right)
        | Expression::Add(left, right)
        | Expression::Subtract(left, right)
        | Expression::Multiply(left, right)
        | Expression::Divide(left, right) => {
            collect_expression_variables(left, variables);
            collect_expression_variables(right, variables);
        }
        Expression::UnaryPlus(inner) | Expression::UnaryMinus(inner) | Expression::Not(inner) => {
            collect_expression_variables(inner, variables);
        }
        Expression::In(needle, haystack) => {
            collect_expression_variables(needle, variables);
            for expression in haystack {
                collect_expression_variables(expression, variables);
            }
        }
        Expression::If(condition, then, otherwise) => {
            collect_expression_variables(condition, variables);
            collect_expression_variables(then, variables);
            collect_expression_variables(otherwise, variables);
        }
        Expression::Coalesce(arguments) | Expression::FunctionCall(_, arguments) => {
            for argument in arguments {
                collect_expression_variables(argument, variables);
            }
        }
        Expression::Exists(pattern) => {
            pattern.on_in_scope_variable(|variable| {
                variables.insert(variable.clone());
            });
        }
    }
}

/// The variables a basic graph pattern binds. Variables standing in for blank nodes are not
/// visible outside the pattern and are left out.
pub fn bgp_variables(patterns: &[TriplePattern]) -> Vec<Variable> {
    let mut result: Vec<Variable> = Vec::new();
    for variable in patterns.iter().flat_map(pattern_variables) {
        if !is_blank_node_variable(&variable) && !result.contains(&variable) {
            result.push(variable);
        }
    }
    result
}

impl Display for SparqlOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.fmt_indented(f, 0)
    }
}
