use crate::bgp::TripleRelationJoiner;
use rdb2rdf_logical::{NodeRelation, TripleRelation};
use rdb2rdf_model::TriplePattern;
use tracing::{debug, trace};

/// Hands out the indices that make table aliases unique within a query.
///
/// A counter must never be shared between queries that are compiled at the same time.
#[derive(Debug, Default)]
pub struct AliasCounter {
    next: usize,
}

impl AliasCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next(&mut self) -> usize {
        let index = self.next.max(1);
        self.next = index + 1;
        index
    }
}

/// The triple relations that can produce a triple pattern.
#[derive(Debug, Clone)]
pub struct CandidateList {
    pattern: TriplePattern,
    candidates: Vec<TripleRelation>,
}

impl CandidateList {
    /// Selects the candidates for `pattern` among `relations`.
    ///
    /// If `index` is given, the tables of every candidate are renamed so that they cannot clash
    /// with the tables of other patterns.
    pub fn create(
        pattern: &TriplePattern,
        relations: &[TripleRelation],
        index: Option<usize>,
    ) -> Self {
        let candidates = relations
            .iter()
            .filter_map(|relation| relation.select_triple(pattern))
            .map(|relation| match index {
                Some(index) => relation.with_prefix(index),
                None => relation,
            })
            .collect();
        Self {
            pattern: pattern.clone(),
            candidates,
        }
    }

    pub fn pattern(&self) -> &TriplePattern {
        &self.pattern
    }

    pub fn candidates(&self) -> &[TripleRelation] {
        &self.candidates
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

/// Translates a basic graph pattern into the node relations that produce its solutions.
///
/// Each returned node relation is one way of producing the pattern from the database. The
/// result is empty if some pattern has no candidate or if no combination of candidates is
/// satisfiable.
pub fn translate_bgp(
    patterns: &[TriplePattern],
    relations: &[TripleRelation],
    use_all_optimizations: bool,
    counter: &mut AliasCounter,
) -> Vec<NodeRelation> {
    let needs_prefix = patterns.len() > 1;
    let mut candidate_lists = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let index = needs_prefix.then(|| counter.next());
        let list = CandidateList::create(pattern, relations, index);
        debug!("{} candidate(s) for pattern {pattern}", list.len());
        if list.is_empty() {
            return Vec::new();
        }
        candidate_lists.push(list);
    }
    // Patterns with few candidates first. The sort is stable so ties keep their order.
    candidate_lists.sort_by_key(CandidateList::len);

    let mut joiners = vec![TripleRelationJoiner::new(use_all_optimizations)];
    for list in &candidate_lists {
        joiners = joiners
            .iter()
            .flat_map(|joiner| joiner.join_all(list.pattern(), list.candidates()))
            .collect();
        trace!(
            "{} joiner(s) left after joining pattern {}",
            joiners.len(),
            list.pattern()
        );
        if joiners.is_empty() {
            return Vec::new();
        }
    }

    joiners
        .iter()
        .map(TripleRelationJoiner::to_node_relation)
        .filter(|relation| !relation.is_empty())
        .collect()
}
