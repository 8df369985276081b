use crate::sparql::NotConvertible;
use rdb2rdf_database::expr::{BinaryOperator, ConstantType, Expression as SqlExpression};
use rdb2rdf_database::types::GenericType;
use rdb2rdf_logical::nodes::{DetermineNodeType, NodeMaker, NodeSetConstraintBuilder, NodeType};
use rdb2rdf_logical::values::ValueMaker;
use rdb2rdf_logical::NodeRelation;
use rdb2rdf_model::vocab::{rdf, xsd};
use rdb2rdf_model::xsd::{
    is_comparable_in_sql, is_numeric_datatype, is_valid_lexical_form, numeric_type, NumericType,
};
use rdb2rdf_model::{
    is_blank_node_variable, Expression, Function, Literal, LiteralRef, NamedNode, NamedNodeRef,
    Term, Variable,
};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, warn};

/// Translates calls of additional functions into SQL.
///
/// Converters are consulted for every function the translator does not know itself.
pub trait FunctionConverter: Debug + Send + Sync {
    /// Returns whether the converter can translate calls of `function`.
    fn supports(&self, function: &Function) -> bool;

    /// Translates a call of `function` with the translated `arguments`. Returns `None` if the
    /// call cannot be expressed in SQL.
    fn convert(&self, function: &Function, arguments: Vec<SqlExpression>) -> Option<SqlExpression>;
}

/// A reference-counted [`FunctionConverter`].
pub type FunctionConverterRef = Arc<dyn FunctionConverter>;

/// The intermediate result of translating a SPARQL expression.
#[derive(Debug, Clone)]
enum Translated {
    /// A variable whose terms are created from a single value of the relation.
    Attribute(NodeMaker),
    /// A fixed RDF term.
    Constant(Term),
    /// An SQL expression that computes a value or a condition.
    Sql(SqlExpression),
}

/// Translates SPARQL filter expressions into conditions on a node relation.
///
/// Expressions that cannot be evaluated by the database are reported as [`NotConvertible`].
/// Comparisons that can never hold for the relation are folded to `FALSE`.
#[derive(Debug)]
pub struct ExpressionTranslator<'a> {
    relation: &'a NodeRelation,
    converters: &'a [FunctionConverterRef],
}

impl<'a> ExpressionTranslator<'a> {
    pub fn new(relation: &'a NodeRelation) -> Self {
        Self {
            relation,
            converters: &[],
        }
    }

    #[must_use]
    pub fn with_converters(self, converters: &'a [FunctionConverterRef]) -> Self {
        Self { converters, ..self }
    }

    /// Translates `expression` into a condition on the rows of the relation.
    pub fn translate(&self, expression: &Expression) -> Result<SqlExpression, NotConvertible> {
        let result = self.condition(expression);
        if let Err(error) = &result {
            debug!("{error}");
        }
        result
    }

    fn condition(&self, expression: &Expression) -> Result<SqlExpression, NotConvertible> {
        match self.translate_expression(expression)? {
            Translated::Sql(condition) => Ok(condition),
            Translated::Constant(term) => effective_boolean_value(expression, &term),
            Translated::Attribute(_) => NotConvertible::err(
                expression,
                "the effective boolean value of a variable is not computed in SQL",
            ),
        }
    }

    fn value(&self, expression: &Expression) -> Result<SqlExpression, NotConvertible> {
        match self.translate_expression(expression)? {
            Translated::Sql(value) => Ok(value),
            Translated::Constant(term) => constant_value(expression, &term),
            Translated::Attribute(node_maker) => literal_value(expression, &node_maker),
        }
    }

    fn translate_expression(&self, expression: &Expression) -> Result<Translated, NotConvertible> {
        match expression {
            Expression::NamedNode(node) => Ok(Translated::Constant(node.clone().into())),
            Expression::Literal(literal) => Ok(Translated::Constant(literal.clone().into())),
            Expression::Variable(variable) => self.variable(expression, variable),
            Expression::Or(left, right) => Ok(Translated::Sql(
                self.condition(left)?.or(self.condition(right)?),
            )),
            Expression::And(left, right) => Ok(Translated::Sql(
                self.condition(left)?.and(self.condition(right)?),
            )),
            Expression::Equal(left, right) => self.equal(expression, left, right, false),
            Expression::SameTerm(left, right) => self.equal(expression, left, right, true),
            Expression::Greater(left, right) => self.binary(BinaryOperator::Greater, left, right),
            Expression::GreaterOrEqual(left, right) => {
                self.binary(BinaryOperator::GreaterOrEqual, left, right)
            }
            Expression::Less(left, right) => self.binary(BinaryOperator::Less, left, right),
            Expression::LessOrEqual(left, right) => {
                self.binary(BinaryOperator::LessOrEqual, left, right)
            }
            Expression::Add(left, right) => self.binary(BinaryOperator::Add, left, right),
            Expression::Subtract(left, right) => {
                self.binary(BinaryOperator::Subtract, left, right)
            }
            Expression::Multiply(left, right) => {
                self.binary(BinaryOperator::Multiply, left, right)
            }
            Expression::Divide(left, right) => self.binary(BinaryOperator::Divide, left, right),
            Expression::UnaryPlus(inner) => self.translate_expression(inner),
            Expression::UnaryMinus(inner) => Ok(Translated::Sql(SqlExpression::unary_minus(
                self.value(inner)?,
            ))),
            Expression::Not(inner) => Ok(Translated::Sql(SqlExpression::not(
                self.condition(inner)?,
            ))),
            Expression::Bound(variable) => Ok(boolean(
                self.relation
                    .node_maker(variable)
                    .is_some_and(|maker| !maker.is_empty()),
            )),
            Expression::FunctionCall(function, arguments) => {
                self.function(expression, function, arguments)
            }
            Expression::Exists(_) => {
                NotConvertible::err(expression, "EXISTS is not translated to SQL")
            }
            Expression::In(_, _) => NotConvertible::err(expression, "IN is not translated to SQL"),
            Expression::If(_, _, _) => {
                NotConvertible::err(expression, "IF is not translated to SQL")
            }
            Expression::Coalesce(_) => {
                NotConvertible::err(expression, "COALESCE is not translated to SQL")
            }
        }
    }

    fn variable(
        &self,
        expression: &Expression,
        variable: &Variable,
    ) -> Result<Translated, NotConvertible> {
        if is_blank_node_variable(variable) {
            return NotConvertible::err(expression, "blank nodes cannot be used in filters");
        }
        let Some(node_maker) = self.relation.node_maker(variable) else {
            return NotConvertible::err(
                expression,
                format!("{variable} is not bound by the relation"),
            );
        };
        match node_maker {
            NodeMaker::Empty => {
                NotConvertible::err(expression, format!("{variable} is never bound"))
            }
            NodeMaker::Fixed { node, .. } => Ok(Translated::Constant(node.clone())),
            NodeMaker::Typed { .. } => {
                if node_maker.projection_specs().len() != 1 {
                    return NotConvertible::err(
                        expression,
                        format!("{variable} is not created from a single value"),
                    );
                }
                Ok(Translated::Attribute(node_maker.clone()))
            }
        }
    }

    fn binary(
        &self,
        operator: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> Result<Translated, NotConvertible> {
        Ok(Translated::Sql(SqlExpression::binary(
            operator,
            self.value(left)?,
            self.value(right)?,
        )))
    }

    /// Translates `=` and, if `same_term` is set, `sameTerm`.
    fn equal(
        &self,
        expression: &Expression,
        left: &Expression,
        right: &Expression,
        same_term: bool,
    ) -> Result<Translated, NotConvertible> {
        let left_translated = self.translate_expression(left)?;
        let right_translated = self.translate_expression(right)?;
        let condition = match (left_translated, right_translated) {
            (Translated::Attribute(node_maker), Translated::Constant(term))
            | (Translated::Constant(term), Translated::Attribute(node_maker)) => {
                attribute_equals_constant(expression, &node_maker, &term, same_term)?
            }
            (Translated::Constant(left), Translated::Constant(right)) => {
                return Ok(boolean(constants_equal(expression, &left, &right, same_term)?));
            }
            (Translated::Attribute(left), Translated::Attribute(right)) => {
                attributes_equal(expression, &left, &right, same_term)?
            }
            (Translated::Sql(condition), Translated::Constant(Term::Literal(literal)))
            | (Translated::Constant(Term::Literal(literal)), Translated::Sql(condition))
                if literal.datatype() == xsd::BOOLEAN =>
            {
                if is_true(literal.value()) {
                    condition
                } else {
                    SqlExpression::not(condition)
                }
            }
            (Translated::Sql(left), right) => {
                SqlExpression::equal(left, self.translated_value(expression, right)?)
            }
            (left, Translated::Sql(right)) => {
                SqlExpression::equal(self.translated_value(expression, left)?, right)
            }
        };
        Ok(Translated::Sql(condition))
    }

    fn translated_value(
        &self,
        expression: &Expression,
        translated: Translated,
    ) -> Result<SqlExpression, NotConvertible> {
        match translated {
            Translated::Sql(value) => Ok(value),
            Translated::Constant(term) => constant_value(expression, &term),
            Translated::Attribute(node_maker) => literal_value(expression, &node_maker),
        }
    }

    fn function(
        &self,
        expression: &Expression,
        function: &Function,
        arguments: &[Expression],
    ) -> Result<Translated, NotConvertible> {
        match (function, arguments) {
            (Function::Str, [argument]) => self.str(expression, argument),
            (Function::Lang, [argument]) => self.lang(expression, argument),
            (Function::Datatype, [argument]) => self.datatype(expression, argument),
            (Function::IsIri, [argument]) => self.type_test(
                expression,
                argument,
                DetermineNodeType::is_iri,
                Term::is_named_node,
            ),
            (Function::IsBlank, [argument]) => self.type_test(
                expression,
                argument,
                DetermineNodeType::is_blank_node,
                Term::is_blank_node,
            ),
            (Function::IsLiteral, [argument]) => self.type_test(
                expression,
                argument,
                DetermineNodeType::is_literal,
                Term::is_literal,
            ),
            (Function::LangMatches, [tag, range]) => {
                match (
                    self.translate_expression(tag)?,
                    self.translate_expression(range)?,
                ) {
                    (
                        Translated::Constant(Term::Literal(tag)),
                        Translated::Constant(Term::Literal(range)),
                    ) => Ok(boolean(lang_matches(tag.value(), range.value()))),
                    _ => NotConvertible::err(
                        expression,
                        "langMatches() is only evaluated for constant arguments",
                    ),
                }
            }
            _ => self.custom_function(expression, function, arguments),
        }
    }

    fn str(
        &self,
        expression: &Expression,
        argument: &Expression,
    ) -> Result<Translated, NotConvertible> {
        match self.translate_expression(argument)? {
            Translated::Attribute(node_maker) => {
                let node_type = DetermineNodeType::of(&node_maker);
                match node_maker.value_maker() {
                    Some(value_maker) if node_type.is_iri() || node_type.is_literal() => {
                        Ok(Translated::Attribute(NodeMaker::typed(
                            NodeType::plain_literal(),
                            value_maker.clone(),
                            node_maker.is_unique(),
                        )))
                    }
                    _ => NotConvertible::err(
                        expression,
                        "str() is only defined for IRIs and literals",
                    ),
                }
            }
            Translated::Constant(Term::NamedNode(node)) => {
                Ok(Translated::Constant(Literal::new_simple_literal(node.as_str()).into()))
            }
            Translated::Constant(Term::Literal(literal)) => {
                Ok(Translated::Constant(Literal::new_simple_literal(literal.value()).into()))
            }
            _ => NotConvertible::err(expression, "str() is only defined for IRIs and literals"),
        }
    }

    fn lang(
        &self,
        expression: &Expression,
        argument: &Expression,
    ) -> Result<Translated, NotConvertible> {
        match self.translate_expression(argument)? {
            Translated::Attribute(node_maker) => {
                let node_type = DetermineNodeType::of(&node_maker);
                if !node_type.is_literal() {
                    warn!("lang() of a non-literal in {expression} is always an error");
                    return Ok(Translated::Sql(SqlExpression::False));
                }
                let language = node_type.language().unwrap_or_default();
                Ok(Translated::Constant(Literal::new_simple_literal(language).into()))
            }
            Translated::Constant(Term::Literal(literal)) => {
                let language = literal.language().unwrap_or_default();
                Ok(Translated::Constant(Literal::new_simple_literal(language).into()))
            }
            Translated::Constant(_) => {
                warn!("lang() of a non-literal in {expression} is always an error");
                Ok(Translated::Sql(SqlExpression::False))
            }
            Translated::Sql(_) => {
                NotConvertible::err(expression, "lang() is only defined for RDF terms")
            }
        }
    }

    fn datatype(
        &self,
        expression: &Expression,
        argument: &Expression,
    ) -> Result<Translated, NotConvertible> {
        match self.translate_expression(argument)? {
            Translated::Attribute(node_maker) => {
                let node_type = DetermineNodeType::of(&node_maker);
                if !node_type.is_literal() {
                    warn!("datatype() of a non-literal in {expression} is always an error");
                    return Ok(Translated::Sql(SqlExpression::False));
                }
                let datatype = if node_type.language().is_some() {
                    rdf::LANG_STRING.into_owned()
                } else {
                    node_type
                        .datatype()
                        .cloned()
                        .unwrap_or_else(|| xsd::STRING.into_owned())
                };
                Ok(Translated::Constant(datatype.into()))
            }
            Translated::Constant(Term::Literal(literal)) => {
                Ok(Translated::Constant(literal.datatype().into_owned().into()))
            }
            Translated::Constant(_) => {
                warn!("datatype() of a non-literal in {expression} is always an error");
                Ok(Translated::Sql(SqlExpression::False))
            }
            Translated::Sql(_) => {
                NotConvertible::err(expression, "datatype() is only defined for RDF terms")
            }
        }
    }

    fn type_test(
        &self,
        expression: &Expression,
        argument: &Expression,
        node_type_test: fn(&DetermineNodeType) -> bool,
        term_test: fn(&Term) -> bool,
    ) -> Result<Translated, NotConvertible> {
        match self.translate_expression(argument)? {
            Translated::Attribute(node_maker) => {
                let node_type = DetermineNodeType::of(&node_maker);
                if node_type.is_empty() {
                    return Ok(Translated::Sql(SqlExpression::False));
                }
                Ok(boolean(node_type_test(&node_type)))
            }
            Translated::Constant(term) => Ok(boolean(term_test(&term))),
            Translated::Sql(_) => {
                NotConvertible::err(expression, "the argument is not an RDF term")
            }
        }
    }

    fn custom_function(
        &self,
        expression: &Expression,
        function: &Function,
        arguments: &[Expression],
    ) -> Result<Translated, NotConvertible> {
        let Some(converter) = self.converters.iter().find(|c| c.supports(function)) else {
            return NotConvertible::err(expression, format!("{function} is not supported"));
        };
        let arguments = arguments
            .iter()
            .map(|argument| self.value(argument))
            .collect::<Result<Vec<_>, _>>()?;
        converter
            .convert(function, arguments)
            .map(Translated::Sql)
            .ok_or_else(|| {
                NotConvertible::new(expression, format!("{function} cannot translate the call"))
            })
    }
}

fn boolean(value: bool) -> Translated {
    Translated::Constant(Literal::from(value).into())
}

fn is_true(value: &str) -> bool {
    matches!(value, "true" | "1")
}

/// The language and the datatype of a literal. Both are `None` for simple literals.
fn literal_shape(literal: LiteralRef<'_>) -> (Option<&str>, Option<NamedNodeRef<'_>>) {
    match literal.language() {
        Some(language) => (Some(language), None),
        None if literal.datatype() == xsd::STRING => (None, None),
        None => (None, Some(literal.datatype())),
    }
}

fn node_numeric_type(node_maker: &NodeMaker) -> Option<NumericType> {
    DetermineNodeType::of(node_maker)
        .datatype()
        .and_then(|datatype| numeric_type(datatype.as_ref()))
}

/// The SQL value that `node_maker` creates its terms from.
fn attribute_value(node_maker: &NodeMaker) -> Option<SqlExpression> {
    match node_maker.value_maker()? {
        ValueMaker::Column(column) => Some(SqlExpression::column(column.clone())),
        ValueMaker::Expression(expression) => Some(expression.clone()),
        ValueMaker::Template(_) | ValueMaker::BlankNodeId(_) => None,
    }
}

/// The SQL value of a literal variable, if the database can compute with it.
fn literal_value(
    expression: &Expression,
    node_maker: &NodeMaker,
) -> Result<SqlExpression, NotConvertible> {
    let node_type = DetermineNodeType::of(node_maker);
    if !node_type.is_literal() {
        return NotConvertible::err(expression, "only literals are compared in SQL");
    }
    if node_type.language().is_none()
        && !is_comparable_in_sql(node_type.datatype().map(NamedNode::as_ref))
    {
        return NotConvertible::err(
            expression,
            "only strings, numbers and dates are compared in SQL",
        );
    }
    attribute_value(node_maker).ok_or_else(|| {
        NotConvertible::new(expression, "the value is created from a pattern")
    })
}

/// The SQL constant for an RDF term.
fn constant_value(expression: &Expression, term: &Term) -> Result<SqlExpression, NotConvertible> {
    let literal = match term {
        Term::NamedNode(node) => {
            return Ok(SqlExpression::constant(node.as_str(), ConstantType::Untyped));
        }
        Term::BlankNode(_) => {
            return NotConvertible::err(expression, "blank nodes have no SQL value");
        }
        Term::Literal(literal) => literal,
    };
    let value = literal.value();
    match literal_shape(literal.as_ref()).1 {
        Some(datatype) if is_numeric_datatype(datatype) => {
            if !is_valid_lexical_form(datatype, value) {
                return NotConvertible::err(expression, format!("{literal} is not a valid number"));
            }
            Ok(SqlExpression::constant(
                value,
                ConstantType::Generic(GenericType::Numeric),
            ))
        }
        Some(datatype) if datatype == xsd::DATE_TIME => Ok(SqlExpression::constant(
            value.replacen('T', " ", 1),
            ConstantType::Generic(GenericType::Timestamp),
        )),
        Some(datatype) if datatype == xsd::BOOLEAN => Ok(if is_true(value) {
            SqlExpression::True
        } else {
            SqlExpression::False
        }),
        _ => Ok(SqlExpression::constant(value, ConstantType::Untyped)),
    }
}

fn effective_boolean_value(
    expression: &Expression,
    term: &Term,
) -> Result<SqlExpression, NotConvertible> {
    let Term::Literal(literal) = term else {
        return NotConvertible::err(expression, "only literals have an effective boolean value");
    };
    let value = literal.value();
    let result = match literal_shape(literal.as_ref()) {
        (None, Some(datatype)) if datatype == xsd::BOOLEAN => is_true(value),
        (None, Some(datatype)) if is_numeric_datatype(datatype) => value
            .parse::<f64>()
            .is_ok_and(|number| number != 0.0 && !number.is_nan()),
        (_, None) => !value.is_empty(),
        _ => {
            return NotConvertible::err(
                expression,
                format!("{literal} has no effective boolean value"),
            )
        }
    };
    Ok(if result {
        SqlExpression::True
    } else {
        SqlExpression::False
    })
}

fn attribute_equals_constant(
    expression: &Expression,
    node_maker: &NodeMaker,
    term: &Term,
    same_term: bool,
) -> Result<SqlExpression, NotConvertible> {
    match term {
        Term::BlankNode(_) => {
            return NotConvertible::err(expression, "blank nodes cannot be compared in SQL");
        }
        Term::Literal(literal) => {
            let (language, datatype) = literal_shape(literal.as_ref());
            if language.is_none() && !is_comparable_in_sql(datatype) {
                return NotConvertible::err(
                    expression,
                    format!("{literal} cannot be compared in SQL"),
                );
            }
            let constant_type = datatype.and_then(numeric_type);
            if let (false, Some(column_type), Some(constant_type)) =
                (same_term, node_numeric_type(node_maker), constant_type)
            {
                if column_type != constant_type {
                    let promoted = column_type.promote(constant_type);
                    if !is_valid_lexical_form(promoted.datatype(), literal.value()) {
                        return Ok(SqlExpression::False);
                    }
                    let value = attribute_value(node_maker).ok_or_else(|| {
                        NotConvertible::new(expression, "the value is created from a pattern")
                    })?;
                    return Ok(SqlExpression::equal(
                        value,
                        SqlExpression::constant(
                            literal.value(),
                            ConstantType::Generic(GenericType::Numeric),
                        ),
                    ));
                }
            }
        }
        Term::NamedNode(_) => {}
    }
    let (selected, condition) = node_maker.select_node(term);
    if selected.is_empty() {
        return Ok(SqlExpression::False);
    }
    Ok(condition)
}

fn attributes_equal(
    expression: &Expression,
    left: &NodeMaker,
    right: &NodeMaker,
    same_term: bool,
) -> Result<SqlExpression, NotConvertible> {
    if let (false, Some(left_type), Some(right_type)) =
        (same_term, node_numeric_type(left), node_numeric_type(right))
    {
        if left_type != right_type {
            let (Some(left), Some(right)) = (attribute_value(left), attribute_value(right)) else {
                return NotConvertible::err(expression, "the values are created from patterns");
            };
            return Ok(SqlExpression::equal(left, right));
        }
    }
    let mut builder = NodeSetConstraintBuilder::new();
    left.describe_self(&mut builder);
    right.describe_self(&mut builder);
    if builder.is_empty() {
        return Ok(SqlExpression::False);
    }
    if builder.is_unsupported() {
        return NotConvertible::err(
            expression,
            "templates with column functions cannot be compared in SQL",
        );
    }
    Ok(builder.constraint())
}

fn constants_equal(
    expression: &Expression,
    left: &Term,
    right: &Term,
    same_term: bool,
) -> Result<bool, NotConvertible> {
    if same_term {
        return Ok(left == right);
    }
    if let (Term::Literal(left), Term::Literal(right)) = (left, right) {
        let left_shape = literal_shape(left.as_ref());
        let right_shape = literal_shape(right.as_ref());
        if let (Some(left_type), Some(right_type)) = (
            left_shape.1.and_then(numeric_type),
            right_shape.1.and_then(numeric_type),
        ) {
            return left_type
                .promote(right_type)
                .value_equals(left.value(), right.value())
                .ok_or_else(|| NotConvertible::new(expression, "invalid numeric literal"));
        }
        if left_shape == (None, None) && right_shape == (None, None) {
            return Ok(left.value() == right.value());
        }
    }
    Ok(left == right)
}

/// Basic filtering of RFC 4647.
fn lang_matches(tag: &str, range: &str) -> bool {
    if range == "*" {
        return !tag.is_empty();
    }
    let tag = tag.to_ascii_lowercase();
    let range = range.to_ascii_lowercase();
    tag == range
        || tag
            .strip_prefix(&range)
            .is_some_and(|rest| rest.starts_with('-'))
}
