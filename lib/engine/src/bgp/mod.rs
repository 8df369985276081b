//! Translation of basic graph patterns into node relations.
//!
//! The [`matcher`] finds the triple relations that can produce each pattern. The [`joiner`]
//! combines one candidate per pattern into a single relation.

mod joiner;
mod matcher;

pub use joiner::TripleRelationJoiner;
pub use matcher::{translate_bgp, AliasCounter, CandidateList};
