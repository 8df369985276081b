use crate::nodes::{BindingMaker, NodeMaker};
use crate::Relation;
use rdb2rdf_common::CompileResult;
use rdb2rdf_database::expr::Expression;
use rdb2rdf_database::op::DatabaseOp;
use rdb2rdf_database::renamer::Renamer;
use rdb2rdf_database::schema::TableName;
use rdb2rdf_model::{position_term, TriplePattern, TriplePosition, Variable};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// A relation together with the node makers that turn its rows into variable bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRelation {
    relation: Relation,
    bindings: BTreeMap<Variable, NodeMaker>,
}

impl NodeRelation {
    pub fn new(relation: Relation, bindings: BTreeMap<Variable, NodeMaker>) -> Self {
        Self { relation, bindings }
    }

    /// A node relation without rows that binds `variables`.
    pub fn empty(variables: impl IntoIterator<Item = Variable>) -> Self {
        Self {
            relation: Relation::empty(),
            bindings: variables
                .into_iter()
                .map(|v| (v, NodeMaker::Empty))
                .collect(),
        }
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    pub fn bindings(&self) -> &BTreeMap<Variable, NodeMaker> {
        &self.bindings
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.bindings.keys()
    }

    pub fn node_maker(&self, variable: &Variable) -> Option<&NodeMaker> {
        self.bindings.get(variable)
    }

    pub fn is_empty(&self) -> bool {
        self.relation.is_empty()
    }

    #[must_use]
    pub fn select(&self, condition: Expression) -> NodeRelation {
        NodeRelation {
            relation: self.relation.select(condition),
            bindings: self.bindings.clone(),
        }
    }

    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> NodeRelation {
        NodeRelation {
            relation: self.relation.rename(renamer),
            bindings: self
                .bindings
                .iter()
                .map(|(variable, maker)| (variable.clone(), maker.rename(renamer)))
                .collect(),
        }
    }

    /// Gives every table a name unique to `index`.
    #[must_use]
    pub fn with_prefix(&self, index: usize) -> NodeRelation {
        self.rename(&self.relation.prefix_renamer(index))
    }

    #[must_use]
    pub fn rename_single_relation(&self, old: &TableName, new: &TableName) -> NodeRelation {
        self.rename(&Renamer::for_tables([(old.clone(), new.clone())]))
    }

    /// Orders the rows by the values of `variable`. Variables whose node maker has no columns
    /// leave the order unchanged.
    #[must_use]
    pub fn order_by(&self, variable: &Variable, ascending: bool) -> NodeRelation {
        let order = self
            .node_maker(variable)
            .map(|maker| maker.order_specs(ascending))
            .unwrap_or_default();
        if order.is_empty() {
            return self.clone();
        }
        NodeRelation {
            relation: self.relation.order_by(order),
            bindings: self.bindings.clone(),
        }
    }

    #[must_use]
    pub fn limit(&self, limit: Option<u64>) -> NodeRelation {
        NodeRelation {
            relation: self.relation.with_limit(limit),
            bindings: self.bindings.clone(),
        }
    }

    pub fn binding_maker(&self) -> BindingMaker {
        BindingMaker::new(self.bindings.clone())
    }

    pub fn to_database_op(&self) -> CompileResult<DatabaseOp> {
        self.relation.to_database_op()
    }
}

impl Display for NodeRelation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "NodeRelation({}", self.relation)?;
        for (variable, maker) in &self.bindings {
            writeln!(f, "    {variable} => {maker}")?;
        }
        f.write_str(")")
    }
}

/// A mapping from the rows of a relation to RDF triples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripleRelation {
    relation: Relation,
    subject: NodeMaker,
    predicate: NodeMaker,
    object: NodeMaker,
}

impl TripleRelation {
    pub fn new(
        relation: Relation,
        subject: NodeMaker,
        predicate: NodeMaker,
        object: NodeMaker,
    ) -> Self {
        Self {
            relation,
            subject,
            predicate,
            object,
        }
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    pub fn node_maker(&self, position: TriplePosition) -> &NodeMaker {
        match position {
            TriplePosition::Subject => &self.subject,
            TriplePosition::Predicate => &self.predicate,
            TriplePosition::Object => &self.object,
        }
    }

    /// Restricts the triple relation to the triples matching the fixed terms of `pattern`.
    ///
    /// Returns `None` if no triple of the relation can match. The resulting relation only
    /// projects the columns its node makers need.
    pub fn select_triple(&self, pattern: &TriplePattern) -> Option<TripleRelation> {
        let mut conditions = Vec::new();
        let mut makers = Vec::with_capacity(3);
        for position in TriplePosition::ALL {
            let maker = self.node_maker(position);
            let maker = match position_term(pattern, position) {
                Some(term) => {
                    let (selected, condition) = maker.select_node(&term);
                    if selected.is_empty() {
                        return None;
                    }
                    conditions.push(condition);
                    selected
                }
                None => maker.clone(),
            };
            makers.push(maker);
        }
        let [subject, predicate, object]: [NodeMaker; 3] = makers.try_into().ok()?;

        let projections = [&subject, &predicate, &object]
            .into_iter()
            .flat_map(NodeMaker::projection_specs)
            .collect::<Vec<_>>();
        let mut relation = self
            .relation
            .select(Expression::conjunction(conditions))
            .project(projections);
        if relation.is_empty() {
            return None;
        }
        if !subject.projection_specs().is_empty() && object.projection_specs().is_empty() {
            relation = relation.swap_limits();
        }
        Some(TripleRelation::new(relation, subject, predicate, object))
    }

    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> TripleRelation {
        TripleRelation {
            relation: self.relation.rename(renamer),
            subject: self.subject.rename(renamer),
            predicate: self.predicate.rename(renamer),
            object: self.object.rename(renamer),
        }
    }

    /// Gives every table a name unique to `index`.
    #[must_use]
    pub fn with_prefix(&self, index: usize) -> TripleRelation {
        self.rename(&self.relation.prefix_renamer(index))
    }

    #[must_use]
    pub fn rename_single_relation(&self, old: &TableName, new: &TableName) -> TripleRelation {
        self.rename(&Renamer::for_tables([(old.clone(), new.clone())]))
    }
}

impl Display for TripleRelation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "TripleRelation({}", self.relation)?;
        for position in TriplePosition::ALL {
            writeln!(f, "    {position} => {}", self.node_maker(position))?;
        }
        f.write_str(")")
    }
}
