use crate::test_utils::{database, iri, paper_author, paper_type, paper_year};
use rdb2rdf_database::vendor::Vendor;
use rdb2rdf_database::SelectStatementBuilder;
use rdb2rdf_logical::{
    CompatibleRelationGroup, NodeRelation, Relation, TripleRelation, VariableConstraints,
};
use rdb2rdf_model::{
    position_variable, Literal, NamedNodePattern, TermPattern, TriplePattern, TriplePosition,
    Variable,
};

fn var(name: &str) -> TermPattern {
    TermPattern::Variable(Variable::new_unchecked(name))
}

fn pattern(subject: TermPattern, predicate: &str, object: TermPattern) -> TriplePattern {
    TriplePattern {
        subject,
        predicate: NamedNodePattern::NamedNode(iri(predicate)),
        object,
    }
}

/// Joins the selected triple relations the way the query engine does.
fn join(patterns: &[(TriplePattern, TripleRelation)]) -> Option<NodeRelation> {
    let mut constraints = VariableConstraints::new();
    let mut relations = Vec::new();
    for (index, (pattern, relation)) in patterns.iter().enumerate() {
        let relation = relation.select_triple(pattern)?.with_prefix(index + 1);
        for position in TriplePosition::ALL {
            if let Some(variable) = position_variable(pattern, position) {
                constraints.add(
                    &variable,
                    relation.node_maker(position),
                    relation.relation().aliases(),
                );
            }
        }
        relations.push(relation.relation().clone());
    }
    if !constraints.satisfiable() {
        return None;
    }
    let relation = Relation::join(&relations)
        .select(constraints.constraint())
        .project(constraints.projections().iter().cloned());
    Some(NodeRelation::new(
        relation,
        constraints.node_makers().clone(),
    ))
}

#[test]
fn test_join_on_shared_subject() {
    let db = database();
    let joined = join(&[
        (
            pattern(var("x"), "year", TermPattern::Literal(Literal::new_simple_literal("2002"))),
            paper_year(&db),
        ),
        (pattern(var("x"), "author", var("a")), paper_author(&db)),
    ])
    .unwrap();

    assert_eq!(joined.bindings().len(), 2);
    assert_eq!(joined.relation().tables().len(), 3);
    let sql = SelectStatementBuilder::new(&joined.to_database_op().unwrap(), Vendor::Sql92).sql();
    assert!(sql.contains(r#"papers AS "T1_papers""#), "{sql}");
    assert!(sql.contains(r#"papers AS "T2_papers""#), "{sql}");
    assert!(sql.contains(r#"people AS "T2_people""#), "{sql}");
    assert!(sql.contains(r#""T1_papers".id = "T2_papers".id"#), "{sql}");
    assert!(sql.contains(r#""T2_papers".author = "T2_people".id"#), "{sql}");
    assert!(sql.contains(r#""T1_papers".year = 2002"#), "{sql}");
}

#[test]
fn test_incompatible_node_makers_do_not_join() {
    let db = database();
    // The subject of the second pattern is a person, never a paper.
    let joined = join(&[
        (pattern(var("x"), "year", var("y")), paper_year(&db)),
        (pattern(var("p"), "author", var("x")), paper_author(&db)),
    ]);
    assert!(joined.is_none());
}

#[test]
fn test_triple_relations_with_different_predicates_are_grouped() {
    let db = database();
    let x = || var("x");
    let type_pattern = TriplePattern {
        subject: x(),
        predicate: NamedNodePattern::Variable(Variable::new_unchecked("p")),
        object: var("o"),
    };
    let relations = [paper_type(&db), paper_year(&db)]
        .iter()
        .map(|relation| join(&[(type_pattern.clone(), relation.clone())]).unwrap())
        .collect::<Vec<_>>();
    let groups = CompatibleRelationGroup::group(relations);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].binding_makers().len(), 2);
    assert_eq!(groups[0].base_relation().projections().len(), 2);
}
