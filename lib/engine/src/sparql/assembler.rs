use crate::bgp::{translate_bgp, AliasCounter};
use crate::sparql::op::bgp_variables;
use crate::sparql::rewriting::{ExpressionTranslator, FunctionConverterRef};
use crate::sparql::{SparqlOp, SqlUnion};
use rdb2rdf_common::{CompileResult, CompilerConfig};
use rdb2rdf_logical::{NodeRelation, TripleRelation};
use rdb2rdf_model::{Expression, TriplePattern};
use tracing::{debug, trace};

/// Replaces the basic graph patterns of an operator tree with SQL-backed operators.
///
/// Filters directly above a basic graph pattern are folded into the SQL statements if
/// [`CompilerConfig::filter_to_sql`] is set. Expressions that cannot be folded into every
/// relation remain as a filter above the [`SparqlOp::Sql`] operator.
#[derive(Debug)]
pub struct Assembler<'a> {
    triple_relations: &'a [TripleRelation],
    config: CompilerConfig,
    converters: &'a [FunctionConverterRef],
}

impl<'a> Assembler<'a> {
    pub fn new(triple_relations: &'a [TripleRelation], config: CompilerConfig) -> Self {
        Self {
            triple_relations,
            config,
            converters: &[],
        }
    }

    #[must_use]
    pub fn with_converters(self, converters: &'a [FunctionConverterRef]) -> Self {
        Self { converters, ..self }
    }

    pub fn assemble(&self, op: SparqlOp, counter: &mut AliasCounter) -> CompileResult<SparqlOp> {
        Ok(match op {
            SparqlOp::Label { inner, .. } => self.assemble(*inner, counter)?,
            SparqlOp::Bgp { patterns } if !patterns.is_empty() => {
                self.assemble_bgp(&patterns, Vec::new(), counter)
            }
            SparqlOp::Filter { expressions, inner } => match *inner {
                SparqlOp::Bgp { patterns } if !patterns.is_empty() => {
                    if self.config.filter_to_sql {
                        self.assemble_bgp(&patterns, expressions, counter)
                    } else {
                        let sql = self.assemble_bgp(&patterns, Vec::new(), counter);
                        SparqlOp::filter(sql, expressions)
                    }
                }
                inner => SparqlOp::filter(self.assemble(inner, counter)?, expressions),
            },
            SparqlOp::Join { left, right } => SparqlOp::Join {
                left: self.assemble_child(left, counter)?,
                right: self.assemble_child(right, counter)?,
            },
            SparqlOp::LeftJoin {
                left,
                right,
                expression,
            } => SparqlOp::LeftJoin {
                left: self.assemble_child(left, counter)?,
                right: self.assemble_child(right, counter)?,
                expression,
            },
            SparqlOp::Union { left, right } => SparqlOp::Union {
                left: self.assemble_child(left, counter)?,
                right: self.assemble_child(right, counter)?,
            },
            SparqlOp::Minus { left, right } => SparqlOp::Minus {
                left: self.assemble_child(left, counter)?,
                right: self.assemble_child(right, counter)?,
            },
            SparqlOp::Graph { name, inner } => SparqlOp::Graph {
                name,
                inner: self.assemble_child(inner, counter)?,
            },
            SparqlOp::Extend {
                inner,
                variable,
                expression,
            } => SparqlOp::Extend {
                inner: self.assemble_child(inner, counter)?,
                variable,
                expression,
            },
            SparqlOp::OrderBy { inner, expression } => SparqlOp::OrderBy {
                inner: self.assemble_child(inner, counter)?,
                expression,
            },
            SparqlOp::Project { inner, variables } => SparqlOp::Project {
                inner: self.assemble_child(inner, counter)?,
                variables,
            },
            SparqlOp::Distinct { inner } => SparqlOp::Distinct {
                inner: self.assemble_child(inner, counter)?,
            },
            SparqlOp::Reduced { inner } => SparqlOp::Reduced {
                inner: self.assemble_child(inner, counter)?,
            },
            SparqlOp::Slice {
                inner,
                start,
                length,
            } => SparqlOp::Slice {
                inner: self.assemble_child(inner, counter)?,
                start,
                length,
            },
            SparqlOp::Group {
                inner,
                variables,
                aggregates,
            } => SparqlOp::Group {
                inner: self.assemble_child(inner, counter)?,
                variables,
                aggregates,
            },
            // Remote patterns are not answered from the mapped database.
            op @ (SparqlOp::Service { .. }
            | SparqlOp::Bgp { .. }
            | SparqlOp::Path { .. }
            | SparqlOp::Values { .. }
            | SparqlOp::Sql(_)
            | SparqlOp::Empty { .. }) => op,
        })
    }

    fn assemble_child(
        &self,
        inner: Box<SparqlOp>,
        counter: &mut AliasCounter,
    ) -> CompileResult<Box<SparqlOp>> {
        Ok(Box::new(self.assemble(*inner, counter)?))
    }

    fn assemble_bgp(
        &self,
        patterns: &[TriplePattern],
        filters: Vec<Expression>,
        counter: &mut AliasCounter,
    ) -> SparqlOp {
        let mut relations = translate_bgp(
            patterns,
            self.triple_relations,
            self.config.use_all_optimizations,
            counter,
        );
        let mut residual = Vec::new();
        for filter in filters {
            if relations.is_empty() {
                break;
            }
            let (remaining, folded_everywhere) = self.fold_filter(&filter, relations);
            relations = remaining;
            if !folded_everywhere {
                residual.push(filter);
            }
        }

        if relations.is_empty() {
            debug!("The basic graph pattern has no solutions");
            return SparqlOp::Empty {
                variables: bgp_variables(patterns),
            };
        }
        debug!(
            "Assembled {} node relation(s), {} residual filter expression(s)",
            relations.len(),
            residual.len()
        );
        SparqlOp::filter(SparqlOp::Sql(SqlUnion::new(relations)), residual)
    }

    /// Applies `filter` to each relation. Relations that can no longer produce a row are dropped.
    ///
    /// Returns the remaining relations and whether the filter was translated for all of them.
    fn fold_filter(
        &self,
        filter: &Expression,
        relations: Vec<NodeRelation>,
    ) -> (Vec<NodeRelation>, bool) {
        let mut folded_everywhere = true;
        let mut remaining = Vec::with_capacity(relations.len());
        for relation in relations {
            let translator =
                ExpressionTranslator::new(&relation).with_converters(self.converters);
            let condition = match translator.translate(filter) {
                Ok(condition) => condition,
                Err(_) => {
                    folded_everywhere = false;
                    remaining.push(relation);
                    continue;
                }
            };
            if condition.is_true() {
                remaining.push(relation);
            } else if condition.is_false() {
                trace!("Filter {filter} removes relation {relation}");
            } else {
                let selected = relation.select(condition);
                if !selected.is_empty() {
                    remaining.push(selected);
                }
            }
        }
        (remaining, folded_everywhere)
    }
}
