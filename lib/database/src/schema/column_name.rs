use crate::schema::{Identifier, TableName};
use rdb2rdf_common::{CompilationError, CompileResult};
use std::fmt::{Display, Formatter};

/// A column reference, optionally qualified with the table it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnName {
    qualifier: Option<TableName>,
    column: Identifier,
}

impl ColumnName {
    pub fn new(qualifier: Option<TableName>, column: Identifier) -> Self {
        Self { qualifier, column }
    }

    pub fn qualified(table: TableName, column: Identifier) -> Self {
        Self::new(Some(table), column)
    }

    pub fn unqualified(column: Identifier) -> Self {
        Self::new(None, column)
    }

    /// Parses `column`, `table.column`, `schema.table.column` or `catalog.schema.table.column`.
    pub fn parse(input: &str) -> CompileResult<ColumnName> {
        let mut parts = Identifier::parse_qualified(input, 1, 4)?;
        let column = parts
            .pop()
            .ok_or_else(|| CompilationError::invalid_identifier(input, "missing column"))?;
        if parts.is_empty() {
            return Ok(ColumnName::unqualified(column));
        }
        let table = TableName::from_parts(parts)
            .ok_or_else(|| CompilationError::invalid_identifier(input, "invalid qualifier"))?;
        Ok(ColumnName::qualified(table, column))
    }

    /// Parses a column name that must carry a table qualifier.
    pub fn parse_qualified(input: &str) -> CompileResult<ColumnName> {
        let result = Self::parse(input)?;
        if result.qualifier.is_none() {
            return Err(CompilationError::invalid_identifier(
                input,
                "column must be qualified with a table name",
            ));
        }
        Ok(result)
    }

    pub fn qualifier(&self) -> Option<&TableName> {
        self.qualifier.as_ref()
    }

    pub fn column(&self) -> &Identifier {
        &self.column
    }

    pub fn is_qualified(&self) -> bool {
        self.qualifier.is_some()
    }

    #[must_use]
    pub fn unqualify(&self) -> ColumnName {
        ColumnName::unqualified(self.column.clone())
    }

    #[must_use]
    pub fn with_qualifier(&self, table: TableName) -> ColumnName {
        ColumnName::qualified(table, self.column.clone())
    }

    /// Checks whether this (possibly unqualified) name refers to `other`.
    pub fn matches(&self, other: &ColumnName) -> bool {
        self.column == other.column
            && (self.qualifier.is_none() || self.qualifier == other.qualifier)
    }
}

impl Display for ColumnName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(qualifier) = &self.qualifier {
            write!(f, "{qualifier}.")?;
        }
        write!(f, "{}", self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let column = ColumnName::parse("papers.year").unwrap();
        assert_eq!(column.qualifier(), Some(&TableName::parse("papers").unwrap()));
        assert_eq!(column.column().name(), "year");

        let unqualified = ColumnName::parse("year").unwrap();
        assert!(!unqualified.is_qualified());
        assert!(unqualified.matches(&column));
        assert!(!column.matches(&ColumnName::parse("authors.year").unwrap()));
    }

    #[test]
    fn test_parse_qualified_requires_table() {
        assert!(ColumnName::parse_qualified("year").is_err());
        assert_eq!(
            ColumnName::parse_qualified("s.papers.year").unwrap().to_string(),
            "s.papers.year"
        );
    }
}
