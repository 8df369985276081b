use rdb2rdf_database::catalog::Database;
use rdb2rdf_database::op::TableOp;
use rdb2rdf_database::schema::{ColumnName, Identifier, TableName};
use rdb2rdf_database::types::GenericType;
use rdb2rdf_database::vendor::Vendor;

pub fn papers_table() -> TableOp {
    TableOp::new(TableName::parse("papers").unwrap())
        .with_column(
            Identifier::undelimited("id"),
            GenericType::Numeric.data_type(),
            false,
        )
        .with_column(
            Identifier::undelimited("title"),
            GenericType::Character.data_type(),
            true,
        )
        .with_column(
            Identifier::undelimited("year"),
            GenericType::Numeric.data_type(),
            true,
        )
        .with_unique_key(vec![Identifier::undelimited("id")])
}

pub fn database(vendor: Vendor) -> Database {
    Database::new("conference", vendor).with_table(papers_table())
}

pub fn col(name: &str) -> ColumnName {
    ColumnName::parse(name).unwrap()
}
