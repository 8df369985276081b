use rdb2rdf_database::op::ProjectionSpec;
use rdb2rdf_database::schema::{Identifier, TableName};
use rdb2rdf_logical::nodes::NodeMaker;
use rdb2rdf_logical::{AliasMap, NodeRelation, Relation, TripleRelation, VariableConstraints};
use rdb2rdf_model::{pattern_variables, position_variable, TriplePattern, TriplePosition};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Variables are registered in this order. The first node maker of a variable is the one
/// that produces its terms.
const REGISTRATION_ORDER: [TriplePosition; 3] = [
    TriplePosition::Object,
    TriplePosition::Predicate,
    TriplePosition::Subject,
];

/// Joins triple relations, one per triple pattern, into a single relation.
///
/// A joiner is immutable. [`TripleRelationJoiner::join`] returns a new joiner that contains one
/// more pattern, or `None` if the patterns joined so far can no longer produce a solution.
#[derive(Debug, Clone)]
pub struct TripleRelationJoiner {
    constraints: VariableConstraints,
    patterns: Vec<TriplePattern>,
    relations: Vec<TripleRelation>,
    use_all_optimizations: bool,
}

impl TripleRelationJoiner {
    /// The joiner without any pattern. Its relation has a single row and no columns.
    ///
    /// If `use_all_optimizations` is set, relations that bind a variable to the same unique key
    /// of the same table share a single table alias instead of being self-joined.
    pub fn new(use_all_optimizations: bool) -> Self {
        Self {
            constraints: VariableConstraints::new(),
            patterns: Vec::new(),
            relations: Vec::new(),
            use_all_optimizations,
        }
    }

    pub fn patterns(&self) -> &[TriplePattern] {
        &self.patterns
    }

    pub fn relations(&self) -> &[TripleRelation] {
        &self.relations
    }

    /// Adds `pattern` produced by `relation` to the join.
    pub fn join(&self, pattern: &TriplePattern, relation: &TripleRelation) -> Option<Self> {
        let mut patterns = self.patterns.clone();
        patterns.push(pattern.clone());
        let mut relations = self.relations.clone();
        relations.push(relation.clone());

        let mut constraints = VariableConstraints::new();
        for (pattern, relation) in patterns.iter().zip(relations.iter_mut()) {
            if self.use_all_optimizations {
                *relation = adopt_aliases(&constraints, pattern, relation);
            }
            for position in REGISTRATION_ORDER {
                if let Some(variable) = position_variable(pattern, position) {
                    let maker = relation.node_maker(position);
                    constraints.add(&variable, maker, &maker_aliases(relation.relation(), maker));
                }
            }
        }
        if !constraints.satisfiable() {
            trace!("Pattern {pattern} cannot be joined with {relation}");
            return None;
        }
        Some(Self {
            constraints,
            patterns,
            relations,
            use_all_optimizations: self.use_all_optimizations,
        })
    }

    /// Joins `pattern` with each of the candidates. Returns one joiner per candidate that can be
    /// joined.
    pub fn join_all(&self, pattern: &TriplePattern, candidates: &[TripleRelation]) -> Vec<Self> {
        candidates
            .iter()
            .filter_map(|candidate| self.join(pattern, candidate))
            .collect()
    }

    /// The relation of the join, projected to the columns of the variables' node makers.
    pub fn to_node_relation(&self) -> NodeRelation {
        let base = Relation::join(
            &self
                .relations
                .iter()
                .map(|r| r.relation().clone())
                .collect::<Vec<_>>(),
        );
        let relation = base
            .select(self.constraints.constraint())
            .project(self.constraints.projections().iter().cloned());
        NodeRelation::new(relation, self.constraints.node_makers().clone())
    }
}

/// The aliases of `relation` that the columns of `maker` refer to.
fn maker_aliases(relation: &Relation, maker: &NodeMaker) -> AliasMap {
    let aliases = relation.aliases();
    AliasMap::new(
        maker
            .projection_specs()
            .iter()
            .flat_map(ProjectionSpec::columns)
            .filter_map(|column| column.qualifier().cloned())
            .filter(|table| aliases.is_alias(table))
            .map(|table| {
                let original = aliases.original_of(&table);
                (table, original)
            }),
    )
}

/// Renames the table of `relation` that produces an already bound variable to the table that
/// produced the variable first.
///
/// This only happens if both produce the variable from the same columns and these columns are
/// a unique key of the table. The two relations then refer to the same row, so joining the
/// table with itself is unnecessary.
fn adopt_aliases(
    constraints: &VariableConstraints,
    pattern: &TriplePattern,
    relation: &TripleRelation,
) -> TripleRelation {
    let mut relation = relation.clone();
    for variable in pattern_variables(pattern) {
        let Some(bound) = constraints.node_makers().get(&variable) else {
            continue;
        };
        let Some(attributes) = AttributeSet::of(bound) else {
            continue;
        };
        let original = constraints
            .relation_aliases()
            .get(&variable)
            .map_or_else(
                || attributes.table.clone(),
                |aliases| aliases.original_of(&attributes.table),
            );
        if !relation.relation().aliases().has_alias(&original)
            || !is_unique_key(relation.relation(), &original, &attributes.columns)
        {
            continue;
        }

        for position in TriplePosition::ALL {
            if position_variable(pattern, position).as_ref() != Some(&variable) {
                continue;
            }
            let Some(existing) = AttributeSet::of(relation.node_maker(position)) else {
                continue;
            };
            if existing.columns == attributes.columns && existing.table != attributes.table {
                debug!(
                    "Adopting alias {} for {} to join {variable} without a self-join",
                    attributes.table, existing.table
                );
                relation = relation.rename_single_relation(&existing.table, &attributes.table);
            }
        }
    }
    relation
}

/// Checks whether `columns` contain a unique key of the database table `table`.
fn is_unique_key(relation: &Relation, table: &TableName, columns: &BTreeSet<Identifier>) -> bool {
    let Some(op) = relation.database().and_then(|db| db.table(table)) else {
        return false;
    };
    op.unique_keys()
        .iter()
        .any(|key| !key.is_empty() && key.iter().all(|c| columns.contains(c.column())))
}

/// The columns a node maker reads, if they all belong to one table.
#[derive(Debug, PartialEq, Eq)]
struct AttributeSet {
    table: TableName,
    columns: BTreeSet<Identifier>,
}

impl AttributeSet {
    fn of(maker: &NodeMaker) -> Option<Self> {
        let mut table: Option<TableName> = None;
        let mut columns = BTreeSet::new();
        for column in maker.projection_specs().iter().flat_map(ProjectionSpec::columns) {
            let qualifier = column.qualifier()?;
            match &table {
                Some(existing) if existing != qualifier => return None,
                Some(_) => {}
                None => table = Some(qualifier.clone()),
            }
            columns.insert(column.column().clone());
        }
        Some(Self {
            table: table?,
            columns,
        })
    }
}
