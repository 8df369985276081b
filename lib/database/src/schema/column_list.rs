use crate::schema::{ColumnName, TableName};
use std::fmt::{Display, Formatter};

/// An ordered list of columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnList(Vec<ColumnName>);

impl ColumnList {
    pub fn new(columns: Vec<ColumnName>) -> Self {
        Self(columns)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnName> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolves a possibly unqualified column against this list.
    ///
    /// Returns `None` if no column or more than one column matches.
    pub fn get(&self, column: &ColumnName) -> Option<&ColumnName> {
        let mut candidates = self.0.iter().filter(|c| column.matches(c));
        let first = candidates.next()?;
        candidates.next().is_none().then_some(first)
    }

    pub fn contains(&self, column: &ColumnName) -> bool {
        self.get(column).is_some()
    }

    pub fn contains_all(&self, other: &ColumnList) -> bool {
        other.iter().all(|c| self.contains(c))
    }

    #[must_use]
    pub fn qualify(&self, table: &TableName) -> ColumnList {
        ColumnList(
            self.0
                .iter()
                .map(|c| c.with_qualifier(table.clone()))
                .collect(),
        )
    }

    #[must_use]
    pub fn unqualify(&self) -> ColumnList {
        ColumnList(self.0.iter().map(ColumnName::unqualify).collect())
    }
}

impl<'a> IntoIterator for &'a ColumnList {
    type Item = &'a ColumnName;
    type IntoIter = std::slice::Iter<'a, ColumnName>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for ColumnList {
    type Item = ColumnName;
    type IntoIter = std::vec::IntoIter<ColumnName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<ColumnName> for ColumnList {
    fn from_iter<T: IntoIterator<Item = ColumnName>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Display for ColumnList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, column) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{column}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(columns: &[&str]) -> ColumnList {
        columns.iter().map(|c| ColumnName::parse(c).unwrap()).collect()
    }

    #[test]
    fn test_resolve_unqualified() {
        let columns = list(&["papers.id", "papers.year", "authors.id"]);
        assert_eq!(
            columns.get(&ColumnName::parse("year").unwrap()),
            Some(&ColumnName::parse("papers.year").unwrap())
        );
        // Ambiguous
        assert_eq!(columns.get(&ColumnName::parse("id").unwrap()), None);
        assert!(columns.contains(&ColumnName::parse("authors.id").unwrap()));
    }

    #[test]
    fn test_qualify() {
        let columns = list(&["id", "year"]);
        let qualified = columns.qualify(&TableName::parse("p").unwrap());
        assert_eq!(qualified.to_string(), "p.id, p.year");
        assert_eq!(qualified.unqualify(), columns);
    }
}
