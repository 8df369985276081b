use rdb2rdf_database::catalog::Database;
use rdb2rdf_database::op::{ProjectionSpec, TableOp};
use rdb2rdf_database::schema::{ColumnName, Identifier, TableName};
use rdb2rdf_database::types::GenericType;
use rdb2rdf_database::vendor::Vendor;
use rdb2rdf_logical::join::parse_join_conditions;
use rdb2rdf_logical::nodes::{NodeMaker, NodeType};
use rdb2rdf_logical::values::{Template, ValueMaker};
use rdb2rdf_logical::{Relation, TripleRelation};
use rdb2rdf_model::vocab::rdf;
use rdb2rdf_model::{NamedNode, Term};
use std::sync::Arc;

pub const EX: &str = "http://example.org/";

pub fn iri(local: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{EX}{local}"))
}

pub fn column(name: &str) -> ColumnName {
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

/// `papers(id, title, year, author)` and `people(id, name)`.
pub fn database() -> Arc<Database> {
    Arc::new(
        Database::new("conference", Vendor::Sql92)
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
                "people",
                &[("id", GenericType::Numeric), ("name", GenericType::Character)],
            )),
    )
}

pub fn paper_maker() -> NodeMaker {
    NodeMaker::typed(
        NodeType::Iri,
        ValueMaker::Template(Template::parse(&format!("{EX}paper/@@papers.id@@")).unwrap()),
        true,
    )
}

pub fn person_maker() -> NodeMaker {
    NodeMaker::typed(
        NodeType::Iri,
        ValueMaker::Template(Template::parse(&format!("{EX}person/@@people.id@@")).unwrap()),
        true,
    )
}

fn papers_relation(db: &Arc<Database>, projections: &[&str]) -> Relation {
    projections
        .iter()
        .fold(
            Relation::builder(Arc::clone(db)).unique(true),
            |builder, projection| {
                builder.add_projection(ProjectionSpec::column(column(projection)))
            },
        )
        .build()
}

/// `?paper rdf:type ex:Paper`
pub fn paper_type(db: &Arc<Database>) -> TripleRelation {
    TripleRelation::new(
        papers_relation(db, &["papers.id"]),
        paper_maker(),
        NodeMaker::fixed(Term::NamedNode(rdf::TYPE.into_owned())),
        NodeMaker::fixed(Term::NamedNode(iri("Paper"))),
    )
}

/// `?paper ex:year ?year`
pub fn paper_year(db: &Arc<Database>) -> TripleRelation {
    TripleRelation::new(
        papers_relation(db, &["papers.id", "papers.year"]),
        paper_maker(),
        NodeMaker::fixed(Term::NamedNode(iri("year"))),
        NodeMaker::typed(
            NodeType::plain_literal(),
            ValueMaker::Column(column("papers.year")),
            false,
        ),
    )
}

/// `?paper ex:author ?person`
pub fn paper_author(db: &Arc<Database>) -> TripleRelation {
    let relation = Relation::builder(Arc::clone(db))
        .add_join_conditions(parse_join_conditions(["papers.author => people.id"]).unwrap())
        .add_projection(ProjectionSpec::column(column("papers.id")))
        .add_projection(ProjectionSpec::column(column("people.id")))
        .build();
    TripleRelation::new(
        relation,
        paper_maker(),
        NodeMaker::fixed(Term::NamedNode(iri("author"))),
        person_maker(),
    )
}
