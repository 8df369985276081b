use crate::schema::Identifier;
use rdb2rdf_common::{CompilationError, CompileResult};
use rustc_hash::FxHasher;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Longest alias that is generated verbatim by [`TableName::with_prefix`].
const MAX_PREFIXED_NAME_LENGTH: usize = 30;

/// A possibly qualified table name (`catalog.schema.table`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableName {
    catalog: Option<Identifier>,
    schema: Option<Identifier>,
    table: Identifier,
}

impl TableName {
    pub fn new(catalog: Option<Identifier>, schema: Option<Identifier>, table: Identifier) -> Self {
        Self {
            catalog,
            schema,
            table,
        }
    }

    pub fn unqualified(table: Identifier) -> Self {
        Self::new(None, None, table)
    }

    /// Parses `table`, `schema.table` or `catalog.schema.table`.
    pub fn parse(input: &str) -> CompileResult<TableName> {
        let parts = Identifier::parse_qualified(input, 1, 3)?;
        Self::from_parts(parts)
            .ok_or_else(|| CompilationError::invalid_identifier(input, "invalid table name"))
    }

    pub(crate) fn from_parts(mut parts: Vec<Identifier>) -> Option<TableName> {
        let table = parts.pop()?;
        let schema = parts.pop();
        let catalog = parts.pop();
        parts
            .is_empty()
            .then(|| TableName::new(catalog, schema, table))
    }

    pub fn catalog(&self) -> Option<&Identifier> {
        self.catalog.as_ref()
    }

    pub fn schema(&self) -> Option<&Identifier> {
        self.schema.as_ref()
    }

    pub fn table(&self) -> &Identifier {
        &self.table
    }

    pub fn is_qualified(&self) -> bool {
        self.schema.is_some() || self.catalog.is_some()
    }

    /// Returns the table identifier if this name has no schema and no catalog.
    pub fn as_unqualified(&self) -> Option<&Identifier> {
        (!self.is_qualified()).then_some(&self.table)
    }

    /// Returns an unqualified alias for this table that is unique for `index`.
    ///
    /// The alias is `T{index}_{schema}_{table}`. If that is longer than 30 characters, a hash of
    /// the full name is used instead of the schema and table.
    pub fn with_prefix(&self, index: usize) -> TableName {
        let mut name = format!("T{index}_");
        if let Some(schema) = &self.schema {
            name.push_str(schema.name());
            name.push('_');
        }
        name.push_str(self.table.name());

        if name.len() > MAX_PREFIXED_NAME_LENGTH {
            let mut hasher = FxHasher::default();
            self.hash(&mut hasher);
            name = format!("T{index}_{:x}", hasher.finish());
        }
        TableName::unqualified(Identifier::delimited(name))
    }
}

impl Display for TableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(catalog) = &self.catalog {
            write!(f, "{catalog}.")?;
        }
        if let Some(schema) = &self.schema {
            write!(f, "{schema}.")?;
        }
        write!(f, "{}", self.table)
    }
}
