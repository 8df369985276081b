use crate::op::DatabaseOp;
use crate::renamer::Renamer;
use crate::schema::ColumnName;
use crate::types::{DataType, GenericType};
use crate::vendor::Vendor;
use std::fmt::{Display, Formatter};

/// Determines the SQL type a constant is rendered with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstantType {
    /// Rendered as a string literal.
    Untyped,
    /// Rendered with the type of the column the constant is compared against.
    Column(ColumnName),
    Generic(GenericType),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Constant {
    value: String,
    kind: ConstantType,
}

impl Constant {
    pub fn new(value: impl Into<String>, kind: ConstantType) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> &ConstantType {
        &self.kind
    }

    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> Constant {
        match &self.kind {
            ConstantType::Column(column) => Constant::new(
                self.value.clone(),
                ConstantType::Column(renamer.apply_to_column(column)),
            ),
            ConstantType::Untyped | ConstantType::Generic(_) => self.clone(),
        }
    }

    pub fn data_type(&self, context: &DatabaseOp) -> Option<DataType> {
        match &self.kind {
            ConstantType::Untyped => None,
            ConstantType::Column(column) => context.column_type(column),
            ConstantType::Generic(generic) => Some(generic.data_type()),
        }
    }

    /// Renders the constant. A value that is invalid for its type becomes `NULL`, which never
    /// compares equal to anything.
    pub fn to_sql(&self, context: &DatabaseOp, vendor: Vendor) -> String {
        match self.data_type(context) {
            Some(data_type) => data_type
                .to_sql_literal(&self.value, vendor)
                .unwrap_or_else(|| "NULL".to_owned()),
            None => vendor.quote_string_literal(&self.value),
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ConstantType::Untyped => write!(f, "Constant({})", self.value),
            ConstantType::Column(column) => write!(f, "Constant({}@{column})", self.value),
            ConstantType::Generic(generic) => {
                write!(f, "Constant({}@{})", self.value, generic.data_type())
            }
        }
    }
}
