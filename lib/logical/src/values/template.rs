use crate::values::{ColumnFunction, ResultRow};
use rdb2rdf_common::CompileResult;
use rdb2rdf_database::expr::{ConstantType, Expression};
use rdb2rdf_database::renamer::Renamer;
use rdb2rdf_database::schema::ColumnName;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

const DELIMITER: &str = "@@";

static EMBEDDED_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@@([^@]+?)(?:\|(urlencode|urlify|encode))?@@").unwrap()
});

/// A string template with embedded column references, such as
/// `http://example.org/paper/@@papers.id@@`.
///
/// A column reference may name a [`ColumnFunction`] that is applied to the column value:
/// `@@people.name|urlify@@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Template {
    first_literal_part: String,
    columns: Vec<ColumnName>,
    functions: Vec<ColumnFunction>,
    /// The literal following each column.
    literal_parts: Vec<String>,
}

impl Template {
    pub fn parse(pattern: &str) -> CompileResult<Template> {
        let mut first_literal_part = None;
        let mut columns = Vec::new();
        let mut functions = Vec::new();
        let mut literal_parts = Vec::new();
        let mut last = 0;
        for captures in EMBEDDED_COLUMN.captures_iter(pattern) {
            let Some(found) = captures.get(0) else {
                continue;
            };
            let literal = pattern[last..found.start()].to_owned();
            if first_literal_part.is_none() {
                first_literal_part = Some(literal);
            } else {
                literal_parts.push(literal);
            }
            columns.push(ColumnName::parse_qualified(&captures[1])?);
            functions.push(
                captures
                    .get(2)
                    .and_then(|name| ColumnFunction::from_name(name.as_str()))
                    .unwrap_or_default(),
            );
            last = found.end();
        }
        let rest = pattern[last..].to_owned();
        let first_literal_part = match first_literal_part {
            Some(first) => {
                literal_parts.push(rest);
                first
            }
            None => rest,
        };
        Ok(Template {
            first_literal_part,
            columns,
            functions,
            literal_parts,
        })
    }

    pub fn columns(&self) -> &[ColumnName] {
        &self.columns
    }

    pub fn first_literal_part(&self) -> &str {
        &self.first_literal_part
    }

    pub fn last_literal_part(&self) -> &str {
        self.literal_parts
            .last()
            .unwrap_or(&self.first_literal_part)
    }

    /// Checks whether the template differs from `other` only in the column names.
    pub fn is_equivalent_to(&self, other: &Template) -> bool {
        self.first_literal_part == other.first_literal_part
            && self.literal_parts == other.literal_parts
            && self.functions == other.functions
    }

    pub fn uses_column_functions(&self) -> bool {
        self.functions.iter().any(|f| *f != ColumnFunction::Identity)
    }

    pub fn matches(&self, value: &str) -> bool {
        !self.value_expression(value).is_false()
    }

    /// The condition on the columns that makes the template produce `value`.
    pub fn value_expression(&self, value: &str) -> Expression {
        let Some(regex) = self.regex() else {
            return Expression::False;
        };
        let Some(captures) = regex.captures(value) else {
            return Expression::False;
        };
        let mut conditions = Vec::with_capacity(self.columns.len());
        for (i, (column, function)) in self.columns.iter().zip(&self.functions).enumerate() {
            let Some(decoded) = captures
                .get(i + 1)
                .and_then(|group| function.decode(group.as_str()))
            else {
                return Expression::False;
            };
            conditions.push(Expression::column_value(column, decoded));
        }
        Expression::conjunction(conditions)
    }

    fn regex(&self) -> Option<Regex> {
        let mut pattern = format!("(?s)^{}", regex::escape(&self.first_literal_part));
        for literal in &self.literal_parts {
            pattern.push_str("(.*?)");
            pattern.push_str(&regex::escape(literal));
        }
        pattern.push('$');
        Regex::new(&pattern).ok()
    }

    /// Fills the template with the values of `row`. Returns `None` if a column is `NULL`.
    pub fn make_value(&self, row: &dyn ResultRow) -> Option<String> {
        let mut result = self.first_literal_part.clone();
        for ((column, function), literal) in self
            .columns
            .iter()
            .zip(&self.functions)
            .zip(&self.literal_parts)
        {
            result.push_str(&function.encode(row.get(column)?));
            result.push_str(literal);
        }
        Some(result)
    }

    /// The template as a concatenation expression. Column functions are ignored.
    pub fn to_expression(&self) -> Expression {
        let mut parts = vec![Expression::constant(
            self.first_literal_part.clone(),
            ConstantType::Untyped,
        )];
        for (column, literal) in self.columns.iter().zip(&self.literal_parts) {
            parts.push(Expression::column(column.clone()));
            parts.push(Expression::constant(literal.clone(), ConstantType::Untyped));
        }
        Expression::concatenation(parts)
    }

    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> Template {
        Template {
            columns: self
                .columns
                .iter()
                .map(|c| renamer.apply_to_column(c))
                .collect(),
            ..self.clone()
        }
    }
}

impl Display for Template {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Template({}", self.first_literal_part)?;
        for ((column, function), literal) in self
            .columns
            .iter()
            .zip(&self.functions)
            .zip(&self.literal_parts)
        {
            write!(f, "{DELIMITER}{column}")?;
            if *function != ColumnFunction::Identity {
                write!(f, "|{function}")?;
            }
            write!(f, "{DELIMITER}{literal}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn template(pattern: &str) -> Template {
        Template::parse(pattern).unwrap()
    }

    #[test]
    fn test_parse() {
        let template = template("http://ex.org/@@people.first|urlify@@_@@people.last@@#me");
        assert_eq!(template.columns().len(), 2);
        assert_eq!(template.first_literal_part(), "http://ex.org/");
        assert_eq!(template.last_literal_part(), "#me");
        assert!(template.uses_column_functions());
        insta::assert_snapshot!(
            template,
            @"Template(http://ex.org/@@people.first|urlify@@_@@people.last@@#me)"
        );
    }

    #[test]
    fn test_template_without_columns() {
        let template = template("http://ex.org/");
        assert_eq!(template.last_literal_part(), "http://ex.org/");
        assert!(template.matches("http://ex.org/"));
        assert!(!template.matches("http://ex.org/x"));
    }

    #[test]
    fn test_value_expression() {
        let template = template("http://ex.org/paper/@@papers.id@@");
        insta::assert_snapshot!(
            template.value_expression("http://ex.org/paper/42"),
            @"Equality(papers.id, Constant(42@papers.id))"
        );
        assert!(template.value_expression("http://ex.org/person/42").is_false());
    }

    #[test]
    fn test_undecodable_value_does_not_match() {
        let template = template("http://ex.org/@@people.name|urlencode@@");
        assert!(!template.matches("http://ex.org/100%"));
        assert!(template.matches("http://ex.org/John+Doe"));
    }

    #[test]
    fn test_make_value() {
        let template = template("http://ex.org/@@people.name|urlencode@@");
        let mut row = BTreeMap::new();
        assert_eq!(template.make_value(&row), None);
        row.insert(ColumnName::parse("people.name").unwrap(), "John Doe".to_owned());
        assert_eq!(
            template.make_value(&row).as_deref(),
            Some("http://ex.org/John+Doe")
        );
    }

    #[test]
    fn test_equivalence_ignores_columns() {
        let left = template("http://ex.org/@@papers.id@@");
        let right = template("http://ex.org/@@T2_papers.id@@");
        assert!(left.is_equivalent_to(&right));
        assert_ne!(left, right);
        assert!(!left.is_equivalent_to(&template("http://ex.org/x@@papers.id@@")));
    }
}
