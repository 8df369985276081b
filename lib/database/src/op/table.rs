use crate::schema::{ColumnList, ColumnName, Identifier, TableName};
use crate::types::DataType;

/// A column of a base table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDef {
    name: Identifier,
    data_type: DataType,
    nullable: bool,
}

impl ColumnDef {
    pub fn new(name: Identifier, data_type: DataType, nullable: bool) -> Self {
        Self {
            name,
            data_type,
            nullable,
        }
    }

    pub fn name(&self) -> &Identifier {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// A base table of the database together with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableOp {
    name: TableName,
    columns: Vec<ColumnDef>,
    unique_keys: Vec<Vec<Identifier>>,
}

impl TableOp {
    pub fn new(name: TableName) -> Self {
        Self {
            name,
            columns: Vec::new(),
            unique_keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_column(mut self, name: Identifier, data_type: DataType, nullable: bool) -> Self {
        self.columns.push(ColumnDef::new(name, data_type, nullable));
        self
    }

    #[must_use]
    pub fn with_unique_key(mut self, key: Vec<Identifier>) -> Self {
        self.unique_keys.push(key);
        self
    }

    pub fn name(&self) -> &TableName {
        &self.name
    }

    pub fn column_defs(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// The columns, qualified with the table name.
    pub fn columns(&self) -> ColumnList {
        self.columns
            .iter()
            .map(|c| ColumnName::qualified(self.name.clone(), c.name.clone()))
            .collect()
    }

    pub fn unique_keys(&self) -> Vec<ColumnList> {
        self.unique_keys
            .iter()
            .map(|key| {
                key.iter()
                    .map(|c| ColumnName::qualified(self.name.clone(), c.clone()))
                    .collect()
            })
            .collect()
    }

    /// Checks whether the given columns contain one of the unique keys.
    pub fn is_unique_key(&self, columns: &[Identifier]) -> bool {
        self.unique_keys
            .iter()
            .any(|key| key.iter().all(|c| columns.contains(c)))
    }

    pub fn column_def(&self, column: &ColumnName) -> Option<&ColumnDef> {
        if column.qualifier().is_some_and(|q| q != &self.name) {
            return None;
        }
        self.columns.iter().find(|c| &c.name == column.column())
    }
}

/// The result of a raw SQL query, accessible under a table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqlOp {
    query: String,
    shape: TableOp,
}

impl SqlOp {
    /// `shape` describes the name, columns and keys of the query result.
    pub fn new(query: impl Into<String>, shape: TableOp) -> Self {
        Self {
            query: query.into(),
            shape,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn shape(&self) -> &TableOp {
        &self.shape
    }

    pub fn name(&self) -> &TableName {
        self.shape.name()
    }
}
