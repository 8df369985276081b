use crate::op::DatabaseOp;
use crate::renamer::Renamer;
use crate::schema::{ColumnList, ColumnName, Identifier, TableName};
use rdb2rdf_common::{CompilationError, CompileResult};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Makes a relation available under a new, unqualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AliasOp {
    original: Arc<DatabaseOp>,
    alias: TableName,
}

impl AliasOp {
    /// Creates an alias. Fails if `alias` is qualified with a schema or catalog.
    pub fn create(original: DatabaseOp, alias: &TableName) -> CompileResult<DatabaseOp> {
        if alias.is_qualified() {
            return Err(CompilationError::InvalidAlias(format!(
                "{alias} must not be qualified"
            )));
        }
        Ok(Self::create_unchecked(original, alias.clone()))
    }

    /// Aliasing an alias replaces the inner alias. Aliasing a named operator with its own name
    /// returns the operator.
    pub(crate) fn create_unchecked(original: DatabaseOp, alias: TableName) -> DatabaseOp {
        let original = match original {
            DatabaseOp::Alias(inner) => Arc::unwrap_or_clone(inner.original),
            other => other,
        };
        if original.table_name() == Some(&alias) {
            return original;
        }
        DatabaseOp::Alias(AliasOp {
            original: Arc::new(original),
            alias,
        })
    }

    /// Creates an alias whose name is `prefix` followed by a hash of `original`.
    pub fn with_unique_name(original: DatabaseOp, prefix: &str) -> AliasOp {
        let mut hasher = FxHasher::default();
        original.hash(&mut hasher);
        let alias = TableName::unqualified(Identifier::delimited(format!(
            "{prefix}{:x}",
            hasher.finish()
        )));
        AliasOp {
            original: Arc::new(original),
            alias,
        }
    }

    pub fn original(&self) -> &DatabaseOp {
        &self.original
    }

    pub fn alias(&self) -> &TableName {
        &self.alias
    }

    pub fn columns(&self) -> ColumnList {
        self.original
            .columns()
            .iter()
            .map(|c| c.with_qualifier(self.alias.clone()))
            .collect()
    }

    /// Maps a column of the alias to the column of the original it stands for.
    pub fn original_column(&self, column: &ColumnName) -> Option<ColumnName> {
        if column.qualifier().is_some_and(|q| q != &self.alias) {
            return None;
        }
        self.original.resolve_column(&column.unqualify())
    }

    pub fn unique_keys(&self) -> Vec<ColumnList> {
        self.original
            .unique_keys()
            .iter()
            .map(|key| key.qualify(&self.alias))
            .collect()
    }

    /// Maps the columns of the original to the columns of the alias.
    pub fn renamer(&self) -> Renamer {
        Renamer::for_columns(
            self.original
                .columns()
                .iter()
                .map(|c| (c.clone(), c.with_qualifier(self.alias.clone()))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::TableOp;
    use crate::types::GenericType;

    fn papers() -> DatabaseOp {
        DatabaseOp::table(
            TableOp::new(TableName::parse("papers").unwrap())
                .with_column(
                    Identifier::undelimited("id"),
                    GenericType::Numeric.data_type(),
                    false,
                )
                .with_unique_key(vec![Identifier::undelimited("id")]),
        )
    }

    #[test]
    fn test_alias_must_be_unqualified() {
        let result = AliasOp::create(papers(), &TableName::parse("s.p").unwrap());
        assert!(matches!(result, Err(CompilationError::InvalidAlias(_))));
    }

    #[test]
    fn test_alias_columns_and_keys() {
        let alias = TableName::parse("p").unwrap();
        let op = AliasOp::create(papers(), &alias).unwrap();
        assert_eq!(op.columns().to_string(), "p.id");
        assert_eq!(
            op.unique_keys(),
            vec![ColumnList::new(vec![ColumnName::parse("p.id").unwrap()])]
        );
        assert_eq!(
            op.column_type(&ColumnName::parse("p.id").unwrap()),
            Some(GenericType::Numeric.data_type())
        );
        assert_eq!(op.column_type(&ColumnName::parse("papers.id").unwrap()), None);
    }

    #[test]
    fn test_alias_collapses() {
        let first = AliasOp::create(papers(), &TableName::parse("p").unwrap()).unwrap();
        let second = AliasOp::create(first, &TableName::parse("q").unwrap()).unwrap();
        assert_eq!(second, AliasOp::create(papers(), &TableName::parse("q").unwrap()).unwrap());
        let back = AliasOp::create(second, &TableName::parse("papers").unwrap()).unwrap();
        assert_eq!(back, papers());
    }
}
