#![doc(test(attr(deny(warnings))))]

mod alias_map;
mod compatible_relation_group;
pub mod join;
mod node_relation;
pub mod nodes;
mod relation;
pub mod values;
mod variable_constraints;

pub use alias_map::AliasMap;
pub use compatible_relation_group::CompatibleRelationGroup;
pub use node_relation::{NodeRelation, TripleRelation};
pub use relation::{Relation, RelationBuilder};
pub use variable_constraints::VariableConstraints;
