use crate::nodes::BindingMaker;
use crate::{NodeRelation, Relation};
use rdb2rdf_database::expr::Expression;
use rdb2rdf_database::op::ProjectionSpec;
use std::sync::Arc;

/// Node relations that can be evaluated by a single SQL statement.
///
/// Relations are compatible if they read the same tables of the same database with the same
/// joins. Their conditions may differ. In that case, the statement selects the rows matching
/// any of the conditions and each binding maker only accepts the rows matching its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibleRelationGroup {
    first: NodeRelation,
    others: Vec<NodeRelation>,
}

impl CompatibleRelationGroup {
    /// Groups node relations. Each relation is added to the first compatible group.
    pub fn group(node_relations: impl IntoIterator<Item = NodeRelation>) -> Vec<Self> {
        let mut groups: Vec<CompatibleRelationGroup> = Vec::new();
        for node_relation in node_relations {
            match groups
                .iter_mut()
                .find(|g| g.is_compatible(node_relation.relation()))
            {
                Some(group) => group.others.push(node_relation),
                None => groups.push(CompatibleRelationGroup {
                    first: node_relation,
                    others: Vec::new(),
                }),
            }
        }
        groups
    }

    pub fn node_relations(&self) -> impl Iterator<Item = &NodeRelation> {
        std::iter::once(&self.first).chain(&self.others)
    }

    fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.node_relations().map(NodeRelation::relation)
    }

    pub fn is_compatible(&self, other: &Relation) -> bool {
        let first = self.first.relation();
        let same_database = match (first.database(), other.database()) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        };
        if !same_database
            || first.join_conditions() != other.join_conditions()
            || first.tables() != other.tables()
            || first.order() != other.order()
            || first.limit() != other.limit()
            || first.limit_inverse() != other.limit_inverse()
        {
            return false;
        }
        let same_originals = first
            .tables()
            .iter()
            .all(|t| first.aliases().original_of(t) == other.aliases().original_of(t));
        if !same_originals {
            return false;
        }
        first.projections() == other.projections()
            || (self.relations().all(Relation::is_unique) && other.is_unique())
    }

    fn has_uniform_condition(&self) -> bool {
        let first = self.first.relation();
        self.relations().all(|r| {
            r.condition() == first.condition() && r.soft_condition() == first.soft_condition()
        })
    }

    fn full_condition(relation: &Relation) -> Expression {
        relation
            .condition()
            .clone()
            .and(relation.soft_condition().clone())
    }

    /// The relation that the statement of this group evaluates.
    pub fn base_relation(&self) -> Relation {
        if self.others.is_empty() {
            return self.first.relation().clone();
        }
        let projections = self
            .relations()
            .flat_map(|r| r.projections().iter().cloned())
            .collect::<Vec<_>>();
        let base = self
            .first
            .relation()
            .with_unique(self.relations().all(Relation::is_unique));
        if self.has_uniform_condition() {
            return base.project(projections);
        }
        let conditions = self
            .relations()
            .map(Self::full_condition)
            .collect::<Vec<_>>();
        let condition_projections = conditions
            .iter()
            .filter(|c| !c.is_true())
            .cloned()
            .map(ProjectionSpec::expression)
            .collect::<Vec<_>>();
        base.with_condition(Expression::disjunction(conditions), Expression::True)
            .project(projections.into_iter().chain(condition_projections))
    }

    /// The binding makers of the group's node relations.
    ///
    /// If the conditions of the relations differ, each binding maker is restricted to the rows
    /// matching its relation's condition.
    pub fn binding_makers(&self) -> Vec<BindingMaker> {
        let uniform = self.others.is_empty() || self.has_uniform_condition();
        self.node_relations()
            .map(|r| {
                let maker = r.binding_maker();
                let condition = Self::full_condition(r.relation());
                if uniform || condition.is_true() {
                    maker
                } else {
                    maker.with_condition(ProjectionSpec::expression(condition))
                }
            })
            .collect()
    }
}
