use crate::test_utils::{compile, compiler, statements, unproject, EX};
use rdb2rdf_common::CompilerConfig;
use rdb2rdf_engine::SparqlOp;
use rdb2rdf_model::Variable;
use spargebra::{Query, SparqlParser};

fn optimized() -> CompilerConfig {
    CompilerConfig::default()
        .with_all_optimizations(true)
        .with_filter_to_sql(true)
}

#[test]
fn test_paper_of_year_uses_single_table() {
    let compiler = compiler(optimized());
    let op = unproject(compile(
        &compiler,
        "SELECT ?x WHERE { ?x a ex:Paper ; ex:year \"2002\" }",
    ));
    let statements = statements(&op);
    assert_eq!(statements.len(), 1);

    let statement = &statements[0];
    assert!(statement.sql.contains(r#"papers AS "T1_papers""#), "{}", statement.sql);
    assert!(!statement.sql.contains("T2_papers"), "{}", statement.sql);
    assert!(statement.sql.contains(r#""T1_papers".year = 2002"#), "{}", statement.sql);

    assert_eq!(statement.binding_makers.len(), 1);
    let node_makers = statement.binding_makers[0].node_makers();
    let x = node_makers.get(&Variable::new_unchecked("x")).unwrap();
    assert!(x.to_string().contains("T1_papers.id"), "{x}");
}

#[test]
fn test_filter_is_folded_into_sql() {
    let compiler = compiler(optimized());
    let op = unproject(compile(
        &compiler,
        "SELECT * WHERE { ?x ex:year ?y FILTER(?y = \"2002\") }",
    ));
    let statements = statements(&op);
    assert_eq!(statements.len(), 1);
    assert!(statements[0].sql.contains("year = 2002"), "{}", statements[0].sql);
}

#[test]
fn test_filter_stays_when_folding_is_disabled() {
    let compiler = compiler(CompilerConfig::default());
    let op = unproject(compile(
        &compiler,
        "SELECT * WHERE { ?x ex:year ?y FILTER(?y = \"2002\") }",
    ));
    let SparqlOp::Filter { expressions, inner } = op else {
        panic!("Expected a filter");
    };
    assert_eq!(expressions.len(), 1);
    assert!(!statements(&inner)[0].sql.contains("2002"));
}

#[test]
fn test_unsupported_filter_is_residual() {
    let compiler = compiler(optimized());
    let op = unproject(compile(
        &compiler,
        "SELECT * WHERE { ?x ex:year ?y FILTER(regex(?y, \"^20\") && ?y = \"2002\") }",
    ));
    let SparqlOp::Filter { expressions, inner } = op else {
        panic!("Expected a filter");
    };
    // The conjunction is split, so only the regular expression remains.
    assert_eq!(expressions.len(), 1);
    assert!(statements(&inner)[0].sql.contains("year = 2002"));
}

#[test]
fn test_pattern_without_mapping_produces_no_solutions() {
    let compiler = compiler(optimized());
    let op = unproject(compile(&compiler, "SELECT * WHERE { ?x ex:unknown ?y }"));
    assert_eq!(
        op,
        SparqlOp::Empty {
            variables: vec![Variable::new_unchecked("x"), Variable::new_unchecked("y")]
        }
    );
}

#[test]
fn test_filter_that_never_holds_produces_no_solutions() {
    let compiler = compiler(optimized());
    let op = unproject(compile(
        &compiler,
        "SELECT * WHERE { ?x ex:year ?y FILTER(?x = <http://example.org/person/1>) }",
    ));
    assert!(matches!(op, SparqlOp::Empty { .. }), "{op}");
}

#[test]
fn test_union_sides_are_compiled_separately() {
    let compiler = compiler(optimized());
    let op = unproject(compile(
        &compiler,
        "SELECT * WHERE { { ?x ex:year ?y } UNION { ?x ex:author ?a } }",
    ));
    let SparqlOp::Union { left, right } = op else {
        panic!("Expected a union");
    };
    assert_eq!(statements(&left).len(), 1);
    assert_eq!(statements(&right).len(), 1);
    assert!(statements(&right)[0].sql.contains("people"));
}

#[test]
fn test_variable_predicate_is_grouped_into_one_statement() {
    let compiler = compiler(optimized());
    let op = unproject(compile(&compiler, "SELECT * WHERE { ?x ?p ?o }"));
    let SparqlOp::Sql(union) = &op else {
        panic!("Expected an SQL operator, got {op}");
    };
    // The type and the year mappings read the same table, the author mapping joins people.
    assert_eq!(union.groups().len(), 2);
    assert_eq!(
        union.variables().into_iter().collect::<Vec<_>>(),
        ["o", "p", "x"].map(Variable::new_unchecked)
    );
}

#[test]
fn test_explain_records_each_stage() {
    let compiler = compiler(optimized());
    let query = SparqlParser::new()
        .with_prefix("ex", EX)
        .unwrap()
        .parse_query("SELECT * WHERE { ?x ex:year ?y FILTER(?y = \"2002\") }")
        .unwrap();
    let Query::Select { pattern, .. } = &query else {
        panic!("Expected a SELECT query");
    };
    let (op, explanation) = compiler.explain(pattern).unwrap();
    assert_eq!(op, explanation.assembled_op);
    assert!(explanation.assembled_op.to_string().starts_with("Project:"));
    assert!(explanation.initial_op.to_string().contains("Filter:"));
    assert!(matches!(
        explanation.pushed_down_op,
        SparqlOp::Project { ref inner, .. } if matches!(**inner, SparqlOp::Filter { .. })
    ));
}

#[test]
fn test_concurrent_compilations_are_independent() {
    let compiler = compiler(optimized());
    let query = "SELECT ?x WHERE { ?x a ex:Paper ; ex:year ?y }";
    let expected = compile(&compiler, query);
    std::thread::scope(|scope| {
        let handles = (0..4)
            .map(|_| scope.spawn(|| compile(&compiler, query)))
            .collect::<Vec<_>>();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
