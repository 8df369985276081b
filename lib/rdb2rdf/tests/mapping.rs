#![cfg(test)]

use rdb2rdf::database::catalog::Database;
use rdb2rdf::database::expr::{Expression, SqlFragment};
use rdb2rdf::database::op::{ProjectionSpec, TableOp};
use rdb2rdf::database::schema::{ColumnName, Identifier, TableName};
use rdb2rdf::database::types::GenericType;
use rdb2rdf::database::vendor::Vendor;
use rdb2rdf::engine::sparql::rewriting::FunctionConverter;
use rdb2rdf::engine::SparqlOp;
use rdb2rdf::error::{ConfigurationError, QueryCompilationError};
use rdb2rdf::logical::join::parse_join_conditions;
use rdb2rdf::logical::nodes::{NodeMaker, NodeType};
use rdb2rdf::logical::values::{Template, ValueMaker};
use rdb2rdf::logical::{Relation, TripleRelation};
use rdb2rdf::mapping::MappedDatabase;
use rdb2rdf::model::vocab::{rdf, xsd};
use rdb2rdf::model::{Function, NamedNode, Term, Variable};
use rdb2rdf::CompilerConfig;
use std::sync::Arc;

const EX: &str = "http://example.org/";
const DC: &str = "http://purl.org/dc/elements/1.1/";

fn column(name: &str) -> ColumnName {
    ColumnName::parse(name).unwrap()
}

fn table(name: &str, columns: &[(&str, GenericType)]) -> TableOp {
    columns.iter().fold(
        TableOp::new(TableName::parse(name).unwrap())
            .with_unique_key(vec![Identifier::undelimited("id")]),
        |table, (column, generic)| {
            table.with_column(
                Identifier::undelimited(*column),
                generic.data_type(),
                *column != "id",
            )
        },
    )
}

fn database(vendor: Vendor) -> Arc<Database> {
    Arc::new(
        Database::new("iswc", vendor)
            .with_table(table(
                "papers",
                &[
                    ("id", GenericType::Numeric),
                    ("title", GenericType::Character),
                    ("year", GenericType::Numeric),
                    ("author", GenericType::Numeric),
                ],
            ))
            .with_table(table(
                "persons",
                &[("id", GenericType::Numeric), ("name", GenericType::Character)],
            )),
    )
}

fn paper() -> NodeMaker {
    NodeMaker::typed(
        NodeType::Iri,
        ValueMaker::Template(Template::parse(&format!("{EX}paper@@papers.id@@")).unwrap()),
        true,
    )
}

fn person() -> NodeMaker {
    NodeMaker::typed(
        NodeType::Iri,
        ValueMaker::Template(Template::parse(&format!("{EX}person@@persons.id@@")).unwrap()),
        true,
    )
}

fn fixed(iri: &str) -> NodeMaker {
    NodeMaker::fixed(Term::NamedNode(NamedNode::new_unchecked(iri)))
}

fn papers(db: &Arc<Database>, columns: &[&str]) -> Relation {
    columns
        .iter()
        .fold(
            Relation::builder(Arc::clone(db)).unique(true),
            |builder, name| builder.add_projection(ProjectionSpec::column(column(name))),
        )
        .build()
}

fn mappings(db: &Arc<Database>) -> Vec<TripleRelation> {
    let authorship = Relation::builder(Arc::clone(db))
        .add_join_conditions(parse_join_conditions(["papers.author => persons.id"]).unwrap())
        .add_projection(ProjectionSpec::column(column("papers.id")))
        .add_projection(ProjectionSpec::column(column("persons.id")))
        .build();
    vec![
        TripleRelation::new(
            papers(db, &["papers.id"]),
            paper(),
            NodeMaker::fixed(Term::NamedNode(rdf::TYPE.into_owned())),
            fixed(&format!("{EX}Paper")),
        ),
        TripleRelation::new(
            papers(db, &["papers.id", "papers.title"]),
            paper(),
            fixed(&format!("{DC}title")),
            NodeMaker::typed(
                NodeType::language_literal("en"),
                ValueMaker::Column(column("papers.title")),
                false,
            ),
        ),
        TripleRelation::new(
            papers(db, &["papers.id", "papers.year"]),
            paper(),
            fixed(&format!("{EX}year")),
            NodeMaker::typed(
                NodeType::typed_literal(xsd::INTEGER.into_owned()),
                ValueMaker::Column(column("papers.year")),
                false,
            ),
        ),
        TripleRelation::new(
            authorship,
            paper(),
            fixed(&format!("{DC}creator")),
            person(),
        ),
    ]
}

fn mapped_database(config: CompilerConfig) -> MappedDatabase {
    MappedDatabase::new(mappings(&database(Vendor::Sql92)), config)
        .with_prefix("ex", EX)
        .unwrap()
        .with_prefix("dc", DC)
        .unwrap()
}

fn optimized() -> CompilerConfig {
    CompilerConfig::default()
        .with_all_optimizations(true)
        .with_filter_to_sql(true)
}

#[test]
fn test_titles_of_year() {
    let db = mapped_database(optimized());
    let query = db
        .compile("SELECT ?title WHERE { ?p a ex:Paper ; dc:title ?title ; ex:year 2002 }")
        .unwrap();
    assert!(!query.is_empty());
    assert_eq!(
        query.sql_variables().into_iter().collect::<Vec<_>>(),
        ["p", "title"].map(Variable::new_unchecked)
    );

    let statements = query.statements().unwrap();
    assert_eq!(statements.len(), 1);
    let sql = &statements[0].sql;
    assert!(sql.contains(r#"papers AS "T1_papers""#), "{sql}");
    assert!(!sql.contains("T2_papers"), "{sql}");
    assert!(!sql.contains("T3_papers"), "{sql}");
    assert!(sql.contains(r#""T1_papers".year = 2002"#), "{sql}");
}

#[test]
fn test_year_of_wrong_type_has_no_solutions() {
    let db = mapped_database(optimized());
    let query = db
        .compile("SELECT ?p WHERE { ?p ex:year \"2002\" }")
        .unwrap();
    assert!(query.is_empty());
    assert!(query.statements().unwrap().is_empty());
}

#[test]
fn test_author_join_is_kept() {
    let db = mapped_database(optimized());
    let query = db
        .compile("SELECT ?a WHERE { ?p dc:creator ?a }")
        .unwrap();
    let statements = query.statements().unwrap();
    assert_eq!(statements.len(), 1);
    assert!(statements[0].sql.contains("persons"), "{}", statements[0].sql);
}

#[test]
fn test_language_filter_is_resolved_statically() {
    let db = mapped_database(optimized());
    let query = db
        .compile("SELECT ?t WHERE { ?p dc:title ?t FILTER(lang(?t) = \"en\") }")
        .unwrap();
    let SparqlOp::Project { inner, .. } = query.op() else {
        panic!("Expected a projection");
    };
    assert!(matches!(**inner, SparqlOp::Sql(_)));

    let query = db
        .compile("SELECT ?t WHERE { ?p dc:title ?t FILTER(lang(?t) = \"de\") }")
        .unwrap();
    assert!(query.is_empty());
}

#[test]
fn test_numeric_filter_is_folded() {
    let db = mapped_database(optimized());
    let query = db
        .compile("SELECT ?p WHERE { ?p ex:year ?y FILTER(?y >= 2000.5) }")
        .unwrap();
    let sql = &query.statements().unwrap()[0].sql;
    assert!(sql.contains(">= 2000.5"), "{sql}");
}

#[test]
fn test_filter_is_kept_without_folding() {
    let db = mapped_database(CompilerConfig::default());
    let query = db
        .compile("SELECT ?p WHERE { ?p ex:year ?y FILTER(?y >= 2000) }")
        .unwrap();
    let SparqlOp::Project { inner, .. } = query.op() else {
        panic!("Expected a projection");
    };
    assert!(matches!(**inner, SparqlOp::Filter { .. }));
}

#[test]
fn test_statements_follow_union_order() {
    let db = mapped_database(optimized());
    let query = db
        .compile("SELECT * WHERE { { ?p dc:creator ?a } UNION { ?p ex:year ?y } }")
        .unwrap();
    let statements = query.statements().unwrap();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].sql.contains("persons"), "{}", statements[0].sql);
    assert!(!statements[1].sql.contains("persons"), "{}", statements[1].sql);
}

#[test]
fn test_mysql_quoting() {
    let db = MappedDatabase::new(mappings(&database(Vendor::MySql)), optimized())
        .with_prefix("ex", EX)
        .unwrap();
    let query = db
        .compile("SELECT ?p WHERE { ?p a ex:Paper ; ex:year 2002 }")
        .unwrap();
    let sql = &query.statements().unwrap()[0].sql;
    assert!(sql.contains("`T1_papers`"), "{sql}");
}

#[test]
fn test_explain() {
    let db = mapped_database(optimized());
    let (query, explanation) = db
        .explain("SELECT ?p WHERE { ?p ex:year ?y FILTER(?y = 2002) }")
        .unwrap();
    assert_eq!(query.op(), &explanation.assembled_op);
    assert_ne!(explanation.initial_op, explanation.assembled_op);
}

#[test]
fn test_invalid_query() {
    let db = mapped_database(optimized());
    assert!(matches!(
        db.compile("SELECT ?p WHERE {"),
        Err(QueryCompilationError::Syntax(_))
    ));
}

#[test]
fn test_invalid_prefix() {
    let result = MappedDatabase::new(Vec::new(), CompilerConfig::default())
        .with_prefix("ex", "not an iri");
    assert!(matches!(
        result,
        Err(ConfigurationError::InvalidIri { ref iri, .. }) if iri == "not an iri"
    ));
}

#[derive(Debug)]
struct Length;

impl FunctionConverter for Length {
    fn supports(&self, function: &Function) -> bool {
        matches!(function, Function::StrLen)
    }

    fn convert(&self, _function: &Function, arguments: Vec<Expression>) -> Option<Expression> {
        let [Expression::Column(column)] = <[Expression; 1]>::try_from(arguments).ok()? else {
            return None;
        };
        Some(SqlFragment::parse(
            &format!("CHAR_LENGTH({column})"),
            Some(GenericType::Numeric),
        ))
    }
}

#[test]
fn test_function_converter() {
    let query = "SELECT ?p WHERE { ?p dc:title ?t FILTER(strlen(?t) > 10) }";
    let without = mapped_database(optimized()).compile(query).unwrap();
    let with = mapped_database(optimized())
        .with_function_converter(Arc::new(Length))
        .compile(query)
        .unwrap();
    let sql = &with.statements().unwrap()[0].sql;
    assert!(sql.contains("CHAR_LENGTH(papers.title)"), "{sql}");

    let SparqlOp::Project { inner, .. } = without.op() else {
        panic!("Expected a projection");
    };
    assert!(matches!(**inner, SparqlOp::Filter { .. }));
    let SparqlOp::Project { inner, .. } = with.op() else {
        panic!("Expected a projection");
    };
    assert!(matches!(**inner, SparqlOp::Sql(_)));
}
