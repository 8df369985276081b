use crate::nodes::{NodeMaker, NodeSetConstraintBuilder};
use crate::AliasMap;
use rdb2rdf_database::expr::Expression;
use rdb2rdf_database::op::ProjectionSpec;
use rdb2rdf_model::Variable;
use std::collections::{BTreeMap, BTreeSet};

/// Tracks the node makers bound to each variable of a join.
///
/// Only the first node maker of a variable is kept. Every further node maker for the same
/// variable contributes to a condition that makes them all produce the same term.
#[derive(Debug, Clone, Default)]
pub struct VariableConstraints {
    node_sets: BTreeMap<Variable, NodeSetConstraintBuilder>,
    node_makers: BTreeMap<Variable, NodeMaker>,
    relation_aliases: BTreeMap<Variable, AliasMap>,
    projections: BTreeSet<ProjectionSpec>,
}

impl VariableConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `node_maker` to `variable`. `aliases` are the aliases of the relation the node
    /// maker belongs to.
    pub fn add(&mut self, variable: &Variable, node_maker: &NodeMaker, aliases: &AliasMap) {
        if !self.node_makers.contains_key(variable) {
            self.node_makers
                .insert(variable.clone(), node_maker.clone());
            self.projections.extend(node_maker.projection_specs());
        }
        node_maker.describe_self(self.node_sets.entry(variable.clone()).or_default());
        self.relation_aliases
            .entry(variable.clone())
            .or_insert_with(|| aliases.clone());
    }

    /// Returns `false` if two node makers of the same variable can never produce the same term.
    pub fn satisfiable(&self) -> bool {
        !self.constraint().is_false()
    }

    /// The condition under which all node makers of each variable produce the same term.
    pub fn constraint(&self) -> Expression {
        if self.node_sets.values().any(NodeSetConstraintBuilder::is_empty) {
            return Expression::False;
        }
        Expression::conjunction(
            self.node_sets
                .values()
                .map(NodeSetConstraintBuilder::constraint),
        )
    }

    /// The first node maker of each variable.
    pub fn node_makers(&self) -> &BTreeMap<Variable, NodeMaker> {
        &self.node_makers
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.node_makers.keys()
    }

    /// The aliases of the relation that contributed the first node maker of each variable.
    pub fn relation_aliases(&self) -> &BTreeMap<Variable, AliasMap> {
        &self.relation_aliases
    }

    /// The projections needed by the retained node makers.
    pub fn projections(&self) -> &BTreeSet<ProjectionSpec> {
        &self.projections
    }
}
