//! Names of tables and columns.

mod column_list;
mod column_name;
mod identifier;
mod table_name;

pub use column_list::ColumnList;
pub use column_name::ColumnName;
pub use identifier::Identifier;
pub use table_name::TableName;
