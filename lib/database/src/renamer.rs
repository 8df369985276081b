use crate::schema::{ColumnName, TableName};
use std::collections::BTreeMap;

/// Renames tables and columns.
///
/// Explicit column mappings take precedence. Other columns are renamed by renaming their
/// qualifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Renamer {
    tables: BTreeMap<TableName, TableName>,
    columns: BTreeMap<ColumnName, ColumnName>,
}

impl Renamer {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn for_tables(tables: impl IntoIterator<Item = (TableName, TableName)>) -> Self {
        Self {
            tables: tables.into_iter().collect(),
            columns: BTreeMap::new(),
        }
    }

    pub fn for_columns(columns: impl IntoIterator<Item = (ColumnName, ColumnName)>) -> Self {
        Self {
            tables: BTreeMap::new(),
            columns: columns.into_iter().collect(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.tables.iter().all(|(from, to)| from == to)
            && self.columns.iter().all(|(from, to)| from == to)
    }

    pub fn apply_to_table(&self, table: &TableName) -> TableName {
        self.tables.get(table).unwrap_or(table).clone()
    }

    pub fn apply_to_column(&self, column: &ColumnName) -> ColumnName {
        if let Some(renamed) = self.columns.get(column) {
            return renamed.clone();
        }
        match column.qualifier() {
            Some(table) if self.tables.contains_key(table) => {
                column.with_qualifier(self.apply_to_table(table))
            }
            _ => column.clone(),
        }
    }

    /// Returns the renamer that undoes this one.
    ///
    /// Only meaningful if the renamer is injective.
    #[must_use]
    pub fn inverse(&self) -> Renamer {
        Renamer {
            tables: self
                .tables
                .iter()
                .map(|(from, to)| (to.clone(), from.clone()))
                .collect(),
            columns: self
                .columns
                .iter()
                .map(|(from, to)| (to.clone(), from.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_columns_by_table() {
        let renamer = Renamer::for_tables([(
            TableName::parse("papers").unwrap(),
            TableName::parse("T1_papers").unwrap(),
        )]);
        let column = ColumnName::parse("papers.year").unwrap();
        let renamed = renamer.apply_to_column(&column);
        assert_eq!(renamed.to_string(), "T1_papers.year");
        assert_eq!(renamer.inverse().apply_to_column(&renamed), column);

        let other = ColumnName::parse("authors.year").unwrap();
        assert_eq!(renamer.apply_to_column(&other), other);
    }

    #[test]
    fn test_explicit_column_mapping_wins() {
        let renamer = Renamer::for_columns([(
            ColumnName::parse("a.x").unwrap(),
            ColumnName::parse("b.y").unwrap(),
        )]);
        assert_eq!(
            renamer.apply_to_column(&ColumnName::parse("a.x").unwrap()),
            ColumnName::parse("b.y").unwrap()
        );
        assert!(Renamer::identity().is_identity());
        assert!(!renamer.is_identity());
    }
}
