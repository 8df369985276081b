use crate::expr::Expression;
use crate::schema::{ColumnName, Identifier, TableName};
use sqlparser::ast::{Ident, Value};
use std::fmt::{Display, Formatter};

/// The SQL dialect of a database.
///
/// Vendors differ in quoting, string concatenation, aliasing and the way result sizes are
/// limited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Vendor {
    #[default]
    Sql92,
    MySql,
    PostgreSql,
    Oracle,
}

impl Vendor {
    fn identifier_quote(self) -> char {
        match self {
            Vendor::MySql => '`',
            Vendor::Sql92 | Vendor::PostgreSql | Vendor::Oracle => '"',
        }
    }

    /// Renders an identifier. Only delimited identifiers are quoted.
    pub fn quote_identifier(self, identifier: &Identifier) -> String {
        if identifier.is_delimited() {
            Ident::with_quote(self.identifier_quote(), identifier.name()).to_string()
        } else {
            identifier.name().to_owned()
        }
    }

    pub fn quote_table_name(self, table: &TableName) -> String {
        let mut result = String::new();
        for part in [table.catalog(), table.schema()].into_iter().flatten() {
            result.push_str(&self.quote_identifier(part));
            result.push('.');
        }
        result.push_str(&self.quote_identifier(table.table()));
        result
    }

    pub fn quote_column_name(self, column: &ColumnName) -> String {
        match column.qualifier() {
            Some(table) => format!(
                "{}.{}",
                self.quote_table_name(table),
                self.quote_identifier(column.column())
            ),
            None => self.quote_identifier(column.column()),
        }
    }

    pub fn quote_string_literal(self, value: &str) -> String {
        let value = match self {
            Vendor::MySql => value.replace('\\', "\\\\"),
            Vendor::Sql92 | Vendor::PostgreSql | Vendor::Oracle => value.to_owned(),
        };
        Value::SingleQuotedString(value).to_string()
    }

    pub fn quote_binary_literal(self, hex: &str) -> String {
        format!("X'{hex}'")
    }

    pub fn quote_date_literal(self, date: &str) -> String {
        format!("DATE {}", self.quote_string_literal(date))
    }

    pub fn quote_time_literal(self, time: &str) -> String {
        format!("TIME {}", self.quote_string_literal(time))
    }

    pub fn quote_timestamp_literal(self, timestamp: &str) -> String {
        format!("TIMESTAMP {}", self.quote_string_literal(timestamp))
    }

    /// Concatenates already rendered SQL fragments.
    pub fn concatenate(self, fragments: &[String]) -> String {
        match self {
            Vendor::MySql => format!("CONCAT({})", fragments.join(", ")),
            Vendor::Sql92 | Vendor::PostgreSql | Vendor::Oracle => {
                format!("({})", fragments.join(" || "))
            }
        }
    }

    /// The text between a table expression and its alias in a `FROM` clause.
    pub fn alias_operator(self) -> &'static str {
        match self {
            Vendor::Oracle => " ",
            Vendor::Sql92 | Vendor::MySql | Vendor::PostgreSql => " AS ",
        }
    }

    /// A table with a single row, used as `FROM` clause if a query reads no table.
    pub fn true_table(self) -> Option<&'static str> {
        match self {
            Vendor::Sql92 => Some("(VALUES(NULL))"),
            Vendor::Oracle => Some("DUAL"),
            Vendor::MySql | Vendor::PostgreSql => None,
        }
    }

    /// The clause appended to a query to limit its result size, if the vendor has one.
    pub fn limit_clause(self, limit: u64) -> Option<String> {
        match self {
            Vendor::Oracle => None,
            Vendor::Sql92 | Vendor::MySql | Vendor::PostgreSql => Some(format!("LIMIT {limit}")),
        }
    }

    /// The condition that limits the result size for vendors without a limit clause.
    pub fn limit_condition(self, limit: u64) -> Expression {
        match self {
            Vendor::Oracle => Expression::sql_fragment(&format!("ROWNUM <= {limit}")),
            Vendor::Sql92 | Vendor::MySql | Vendor::PostgreSql => Expression::True,
        }
    }

    /// Turns a boolean expression into one that can appear in a select list.
    pub fn boolean_to_simple_expression(self, expression: Expression) -> Expression {
        match self {
            Vendor::Oracle => Expression::boolean_to_integer(expression),
            Vendor::Sql92 | Vendor::MySql | Vendor::PostgreSql => expression,
        }
    }
}

impl Display for Vendor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Vendor::Sql92 => f.write_str("SQL92"),
            Vendor::MySql => f.write_str("MySQL"),
            Vendor::PostgreSql => f.write_str("PostgreSQL"),
            Vendor::Oracle => f.write_str("Oracle"),
        }
    }
}
