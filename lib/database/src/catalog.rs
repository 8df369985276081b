use crate::op::{DatabaseOp, TableOp};
use crate::schema::TableName;
use crate::vendor::Vendor;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A database connection as seen by the compiler: its SQL dialect and the tables it contains.
///
/// Two databases are the same if their ids are equal. Relations of different databases can
/// never be joined.
#[derive(Debug, Clone)]
pub struct Database {
    id: String,
    vendor: Vendor,
    tables: BTreeMap<TableName, Arc<TableOp>>,
}

impl Database {
    pub fn new(id: impl Into<String>, vendor: Vendor) -> Self {
        Self {
            id: id.into(),
            vendor,
            tables: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_table(mut self, table: TableOp) -> Self {
        self.tables.insert(table.name().clone(), Arc::new(table));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn table(&self, name: &TableName) -> Option<DatabaseOp> {
        self.tables.get(name).map(|t| DatabaseOp::Table(Arc::clone(t)))
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableOp> {
        self.tables.values().map(AsRef::as_ref)
    }
}

impl PartialEq for Database {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Database {}
