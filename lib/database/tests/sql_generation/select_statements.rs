use crate::test_utils::{col, database};
use rdb2rdf_common::CompileResult;
use rdb2rdf_database::expr::{ColumnListEquality, ConstantType, Expression};
use rdb2rdf_database::op::{AliasOp, DatabaseOp, InnerJoinOp, ProjectionSpec, SqlOp, TableOp};
use rdb2rdf_database::schema::{ColumnList, Identifier, TableName};
use rdb2rdf_database::types::GenericType;
use rdb2rdf_database::vendor::Vendor;
use rdb2rdf_database::SelectStatementBuilder;
use std::collections::BTreeSet;

fn papers(vendor: Vendor) -> DatabaseOp {
    database(vendor)
        .table(&TableName::parse("papers").unwrap())
        .unwrap()
}

#[test]
fn test_self_join_of_aliases() -> CompileResult<()> {
    let t1 = AliasOp::create(papers(Vendor::Sql92), &TableName::parse("T1")?)?;
    let t2 = AliasOp::create(papers(Vendor::Sql92), &TableName::parse("T2")?)?;
    let condition = ColumnListEquality::new(
        ColumnList::new(vec![col("T1.id")]),
        ColumnList::new(vec![col("T2.id")]),
    );
    let op = InnerJoinOp::join(vec![t2, t1], BTreeSet::from([condition]))?
        .select(Expression::column_value(&col("T1.year"), "2002"))
        .project(vec![
            ProjectionSpec::column(col("T1.title")),
            ProjectionSpec::column(col("T2.title")),
        ]);

    insta::assert_snapshot!(SelectStatementBuilder::new(&op, Vendor::Sql92).sql(), @r"
    SELECT T1.title, T2.title
    FROM papers AS T1, papers AS T2
    WHERE T1.year = 2002 AND T1.id = T2.id
    ");
    Ok(())
}

#[test]
fn test_string_constants_are_escaped() {
    let op = papers(Vendor::MySql).select(Expression::column_value(
        &col("papers.title"),
        r"O'Reilly \o/",
    ));
    insta::assert_snapshot!(SelectStatementBuilder::new(&op, Vendor::Sql92).sql(), @r"
    SELECT papers.id, papers.title, papers.year
    FROM papers
    WHERE papers.title = 'O''Reilly \o/'
    ");
    insta::assert_snapshot!(SelectStatementBuilder::new(&op, Vendor::MySql).sql(), @r"
    SELECT papers.id, papers.title, papers.year
    FROM papers
    WHERE papers.title = 'O''Reilly \\o/'
    ");
}

#[test]
fn test_invalid_numeric_constant_becomes_null() {
    let op = papers(Vendor::Sql92).select(Expression::column_value(&col("papers.year"), "abc"));
    insta::assert_snapshot!(SelectStatementBuilder::new(&op, Vendor::Sql92).sql(), @r"
    SELECT papers.id, papers.title, papers.year
    FROM papers
    WHERE papers.year = NULL
    ");
}

#[test]
fn test_computed_column_uses_vendor_concatenation() {
    let uri = Expression::concatenation([
        Expression::constant("http://example.org/paper/", ConstantType::Untyped),
        Expression::column(col("papers.id")),
    ]);
    let op = papers(Vendor::MySql)
        .project(vec![ProjectionSpec::expression(uri)])
        .distinct();

    let mysql = SelectStatementBuilder::new(&op, Vendor::MySql).sql();
    assert!(mysql.starts_with(
        "SELECT DISTINCT CONCAT('http://example.org/paper/', papers.id) AS `EXPR"
    ));
    let postgres = SelectStatementBuilder::new(&op, Vendor::PostgreSql).sql();
    assert!(postgres.starts_with(
        "SELECT DISTINCT ('http://example.org/paper/' || papers.id) AS \"EXPR"
    ));
}

#[test]
fn test_delimited_identifiers_are_quoted() {
    let table = TableOp::new(TableName::unqualified(Identifier::delimited("Paper List")))
        .with_column(
            Identifier::delimited("Title \"Main\""),
            GenericType::Character.data_type(),
            true,
        );
    let op = DatabaseOp::table(table);
    insta::assert_snapshot!(SelectStatementBuilder::new(&op, Vendor::PostgreSql).sql(), @r#"
    SELECT "Paper List"."Title ""Main"""
    FROM "Paper List"
    "#);
}

#[test]
fn test_sql_relation_is_a_subquery() -> CompileResult<()> {
    let shape = TableOp::new(TableName::parse("recent")?).with_column(
        Identifier::undelimited("id"),
        GenericType::Numeric.data_type(),
        false,
    );
    let op = DatabaseOp::sql(SqlOp::new(
        "SELECT id FROM papers WHERE year > 2000",
        shape,
    ));
    insta::assert_snapshot!(SelectStatementBuilder::new(&op, Vendor::Oracle).sql(), @r"
    SELECT recent.id
    FROM (SELECT id FROM papers WHERE year > 2000) recent
    ");
    Ok(())
}
