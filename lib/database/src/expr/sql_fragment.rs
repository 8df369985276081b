use crate::expr::Expression;
use crate::renamer::Renamer;
use crate::schema::ColumnName;
use crate::types::GenericType;
use crate::vendor::Vendor;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

static COLUMN_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)+\b").unwrap()
});

/// A raw SQL expression with its column references identified, so that it can be renamed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SqlFragment {
    /// Always one element longer than `columns`.
    literal_parts: Vec<String>,
    columns: Vec<ColumnName>,
    generic_type: Option<GenericType>,
}

impl SqlFragment {
    /// Parses `sql`. The fragments `1` and `0` become `TRUE` and `FALSE`.
    ///
    /// Every `table.column` outside of string literals is considered a column reference.
    pub fn parse(sql: &str, generic_type: Option<GenericType>) -> Expression {
        let sql = sql.trim();
        match sql {
            "1" => return Expression::True,
            "0" => return Expression::False,
            _ => {}
        }

        let mut literal_parts = Vec::new();
        let mut columns = Vec::new();
        let mut last = 0;
        for (start, end) in unquoted_ranges(sql) {
            for found in COLUMN_REFERENCE.find_iter(&sql[start..end]) {
                let Ok(column) = ColumnName::parse_qualified(found.as_str()) else {
                    continue;
                };
                literal_parts.push(sql[last..start + found.start()].to_owned());
                columns.push(column);
                last = start + found.end();
            }
        }
        literal_parts.push(sql[last..].to_owned());

        Expression::SqlFragment(SqlFragment {
            literal_parts,
            columns,
            generic_type,
        })
    }

    pub fn columns(&self) -> &[ColumnName] {
        &self.columns
    }

    pub fn generic_type(&self) -> Option<GenericType> {
        self.generic_type
    }

    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> SqlFragment {
        SqlFragment {
            literal_parts: self.literal_parts.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| renamer.apply_to_column(c))
                .collect(),
            generic_type: self.generic_type,
        }
    }

    pub(crate) fn to_sql(&self, vendor: Vendor) -> String {
        self.render(|c| vendor.quote_column_name(c))
    }

    fn render(&self, column: impl Fn(&ColumnName) -> String) -> String {
        let mut result = String::from("(");
        for (i, part) in self.literal_parts.iter().enumerate() {
            result.push_str(part);
            if let Some(c) = self.columns.get(i) {
                result.push_str(&column(c));
            }
        }
        result.push(')');
        result
    }
}

/// Returns the byte ranges of `sql` that are not inside single-quoted string literals.
fn unquoted_ranges(sql: &str) -> Vec<(usize, usize)> {
    let mut result = Vec::new();
    let mut in_literal = false;
    let mut start = 0;
    for (i, c) in sql.char_indices() {
        if c != '\'' {
            continue;
        }
        if in_literal {
            start = i + 1;
        } else {
            result.push((start, i));
        }
        in_literal = !in_literal;
    }
    if !in_literal {
        result.push((start, sql.len()));
    }
    result
}

impl Display for SqlFragment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SQL{}", self.render(ToString::to_string))
    }
}
