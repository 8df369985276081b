use rdb2rdf_common::CompileResult;
use rdb2rdf_database::vendor::Vendor;
use rdb2rdf_database::SelectStatementBuilder;
use rdb2rdf_logical::nodes::BindingMaker;
use rdb2rdf_logical::{CompatibleRelationGroup, NodeRelation};
use rdb2rdf_model::Variable;
use std::collections::BTreeSet;

/// The union of node relations that are evaluated by the database.
///
/// Compatible relations are grouped so that each group needs a single SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlUnion {
    groups: Vec<CompatibleRelationGroup>,
}

impl SqlUnion {
    pub fn new(node_relations: Vec<NodeRelation>) -> Self {
        Self {
            groups: CompatibleRelationGroup::group(node_relations),
        }
    }

    pub fn groups(&self) -> &[CompatibleRelationGroup] {
        &self.groups
    }

    /// The variables bound by any of the relations.
    pub fn variables(&self) -> BTreeSet<Variable> {
        self.groups
            .iter()
            .flat_map(CompatibleRelationGroup::node_relations)
            .flat_map(NodeRelation::variables)
            .cloned()
            .collect()
    }

    /// Renders one SQL statement per group.
    pub fn statements(&self) -> CompileResult<Vec<SqlStatement>> {
        self.groups
            .iter()
            .map(|group| {
                let relation = group.base_relation();
                let vendor = relation
                    .database()
                    .map_or_else(Vendor::default, |db| db.vendor());
                let op = relation.to_database_op()?;
                Ok(SqlStatement {
                    sql: SelectStatementBuilder::new(&op, vendor).sql(),
                    binding_makers: group.binding_makers(),
                })
            })
            .collect()
    }
}

/// An SQL statement and the binding makers that turn its rows into solutions.
#[derive(Debug, Clone)]
pub struct SqlStatement {
    pub sql: String,
    pub binding_makers: Vec<BindingMaker>,
}
