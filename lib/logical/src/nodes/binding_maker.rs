use crate::nodes::NodeMaker;
use crate::values::ResultRow;
use rdb2rdf_database::op::ProjectionSpec;
use rdb2rdf_database::renamer::Renamer;
use rdb2rdf_model::{Term, Variable};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Creates a solution from a database row.
///
/// A conditional binding maker only produces a solution for rows in which its condition column
/// is true. This allows several node relations to share one SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingMaker {
    node_makers: BTreeMap<Variable, NodeMaker>,
    condition: Option<ProjectionSpec>,
}

impl BindingMaker {
    pub fn new(node_makers: BTreeMap<Variable, NodeMaker>) -> Self {
        Self {
            node_makers,
            condition: None,
        }
    }

    #[must_use]
    pub fn with_condition(self, condition: ProjectionSpec) -> Self {
        Self {
            condition: Some(condition),
            ..self
        }
    }

    pub fn node_makers(&self) -> &BTreeMap<Variable, NodeMaker> {
        &self.node_makers
    }

    pub fn condition(&self) -> Option<&ProjectionSpec> {
        self.condition.as_ref()
    }

    /// Returns `None` if the condition does not hold for `row` or if a variable cannot be
    /// bound.
    pub fn make_binding(&self, row: &dyn ResultRow) -> Option<BTreeMap<Variable, Term>> {
        if let Some(condition) = &self.condition {
            let value = row.get(condition.column_name())?;
            if matches!(value, "" | "0" | "false") {
                return None;
            }
        }
        self.node_makers
            .iter()
            .map(|(variable, maker)| Some((variable.clone(), maker.make_node(row)?)))
            .collect()
    }

    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> BindingMaker {
        BindingMaker {
            node_makers: self
                .node_makers
                .iter()
                .map(|(variable, maker)| (variable.clone(), maker.rename(renamer)))
                .collect(),
            condition: self.condition.as_ref().map(|c| c.rename(renamer)),
        }
    }
}

impl Display for BindingMaker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("BindingMaker(")?;
        for (i, (variable, maker)) in self.node_makers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{variable} => {maker}")?;
        }
        if let Some(condition) = &self.condition {
            write!(f, " WHERE {condition}")?;
        }
        f.write_str(")")
    }
}
