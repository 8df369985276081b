use crate::test_utils::{database, iri, paper_author, paper_year, pattern, triple_relations, var};
use rdb2rdf_database::vendor::Vendor;
use rdb2rdf_database::SelectStatementBuilder;
use rdb2rdf_engine::bgp::{translate_bgp, AliasCounter, TripleRelationJoiner};
use rdb2rdf_logical::NodeRelation;
use rdb2rdf_model::vocab::rdf;
use rdb2rdf_model::{Literal, NamedNodePattern, TermPattern, TriplePattern, Variable};

fn type_pattern() -> TriplePattern {
    TriplePattern {
        subject: var("x"),
        predicate: NamedNodePattern::NamedNode(rdf::TYPE.into_owned()),
        object: TermPattern::NamedNode(iri("Paper")),
    }
}

fn year_2002_pattern() -> TriplePattern {
    pattern(
        var("x"),
        "year",
        TermPattern::Literal(Literal::new_simple_literal("2002")),
    )
}

fn translate(patterns: &[TriplePattern], use_all_optimizations: bool) -> Vec<NodeRelation> {
    translate_bgp(
        patterns,
        &triple_relations(),
        use_all_optimizations,
        &mut AliasCounter::new(),
    )
}

fn sql(relation: &NodeRelation) -> String {
    SelectStatementBuilder::new(&relation.to_database_op().unwrap(), Vendor::Sql92).sql()
}

#[test]
fn test_pattern_without_candidates_prunes_bgp() {
    let relations = translate(
        &[type_pattern(), pattern(var("x"), "unknown", var("y"))],
        true,
    );
    assert!(relations.is_empty());
}

#[test]
fn test_pattern_with_variable_predicate_matches_every_mapping() {
    let relations = translate(
        &[TriplePattern {
            subject: var("s"),
            predicate: NamedNodePattern::Variable(Variable::new_unchecked("p")),
            object: var("o"),
        }],
        false,
    );
    assert_eq!(relations.len(), 3);
    for relation in &relations {
        assert_eq!(relation.bindings().len(), 3);
    }
}

#[test]
fn test_incompatible_shared_variable_does_not_join() {
    // ?x is a paper in the first pattern and a person in the second one.
    let relations = translate(
        &[
            pattern(var("x"), "year", var("y")),
            pattern(var("p"), "author", var("x")),
        ],
        true,
    );
    assert!(relations.is_empty());
}

#[test]
fn test_joiner_rejects_unsatisfiable_combination() {
    let db = database();
    let joiner = TripleRelationJoiner::new(false)
        .join(&pattern(var("x"), "year", var("y")), &paper_year(&db))
        .unwrap();
    assert_eq!(joiner.patterns().len(), 1);
    assert!(joiner
        .join(&pattern(var("p"), "author", var("x")), &paper_author(&db))
        .is_none());
    // Only the year mapping produces literals for ?y.
    let candidates = [paper_author(&db), paper_year(&db)];
    assert_eq!(
        joiner
            .join_all(&pattern(var("z"), "author", var("y")), &candidates)
            .len(),
        1
    );
}

#[test]
fn test_self_join_on_unique_key_is_avoided() {
    let relations = translate(&[type_pattern(), year_2002_pattern()], true);
    assert_eq!(relations.len(), 1);
    let relation = &relations[0];
    assert_eq!(relation.relation().tables().len(), 1);

    let sql = sql(relation);
    assert!(sql.contains(r#"papers AS "T1_papers""#), "{sql}");
    assert!(!sql.contains("T2_papers"), "{sql}");
    assert!(sql.contains(r#""T1_papers".year = 2002"#), "{sql}");
}

#[test]
fn test_self_join_is_kept_without_optimizations() {
    let relations = translate(&[type_pattern(), year_2002_pattern()], false);
    assert_eq!(relations.len(), 1);
    let relation = &relations[0];
    assert_eq!(relation.relation().tables().len(), 2);

    let sql = sql(relation);
    assert!(sql.contains(r#"papers AS "T1_papers""#), "{sql}");
    assert!(sql.contains(r#"papers AS "T2_papers""#), "{sql}");
    assert!(sql.contains(r#""T1_papers".id = "T2_papers".id"#), "{sql}");
}

#[test]
fn test_aliases_are_unique_across_basic_graph_patterns() {
    let mut counter = AliasCounter::new();
    let patterns = [type_pattern(), pattern(var("x"), "year", var("y"))];
    let first = translate_bgp(&patterns, &triple_relations(), false, &mut counter);
    let second = translate_bgp(&patterns, &triple_relations(), false, &mut counter);
    let first_sql = sql(&first[0]);
    let second_sql = sql(&second[0]);
    assert!(first_sql.contains("T1_papers"), "{first_sql}");
    assert!(second_sql.contains("T3_papers"), "{second_sql}");
    assert!(!second_sql.contains("T1_papers"), "{second_sql}");
}
