use crate::nodes::NodeSetFilter;
use rdb2rdf_model::vocab::xsd;
use rdb2rdf_model::xsd::is_valid_lexical_form;
use rdb2rdf_model::{BlankNode, Literal, LiteralRef, NamedNode, Term};
use rustc_hash::FxHasher;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// The kind of RDF term a node maker creates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeType {
    Iri,
    BlankNode,
    /// A literal. Simple literals have neither a language nor a datatype.
    Literal {
        language: Option<String>,
        datatype: Option<NamedNode>,
    },
}

impl NodeType {
    pub fn plain_literal() -> Self {
        NodeType::Literal {
            language: None,
            datatype: None,
        }
    }

    pub fn language_literal(language: &str) -> Self {
        NodeType::Literal {
            language: Some(language.to_ascii_lowercase()),
            datatype: None,
        }
    }

    /// A typed literal. `xsd:string` is treated as a simple literal.
    pub fn typed_literal(datatype: NamedNode) -> Self {
        NodeType::Literal {
            language: None,
            datatype: (datatype.as_ref() != xsd::STRING).then_some(datatype),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, NodeType::Literal { .. })
    }

    /// Returns the database value that corresponds to `node`, or `None` if this type never
    /// creates `node`.
    pub fn extract_value(&self, node: &Term) -> Option<String> {
        match (self, node) {
            (NodeType::Iri, Term::NamedNode(node)) => Some(node.as_str().to_owned()),
            (NodeType::BlankNode, Term::BlankNode(node)) => Some(node.as_str().to_owned()),
            (NodeType::Literal { language, datatype }, Term::Literal(literal)) => {
                let (node_language, node_datatype) = literal_shape(literal.as_ref());
                if language.as_deref() != node_language.as_deref() || *datatype != node_datatype {
                    return None;
                }
                let value = literal.value();
                let Some(datatype) = datatype else {
                    return Some(value.to_owned());
                };
                if !is_valid_lexical_form(datatype.as_ref(), value) {
                    return None;
                }
                let datatype = datatype.as_ref();
                if datatype == xsd::BOOLEAN {
                    Some(if matches!(value, "0" | "false") { "0" } else { "1" }.to_owned())
                } else if datatype == xsd::DATE_TIME {
                    Some(value.replacen('T', " ", 1).trim_end_matches('Z').to_owned())
                } else if datatype == xsd::DATE {
                    Some(value.trim_end_matches('Z').to_owned())
                } else {
                    Some(value.to_owned())
                }
            }
            _ => None,
        }
    }

    /// Creates the term for a database value. Returns `None` if the value is not valid for
    /// this type.
    pub fn make_node(&self, value: &str) -> Option<Term> {
        match self {
            NodeType::Iri => NamedNode::new(value).ok().map(Term::NamedNode),
            NodeType::BlankNode => Some(Term::BlankNode(
                BlankNode::new(value).unwrap_or_else(|_| {
                    let mut hasher = FxHasher::default();
                    value.hash(&mut hasher);
                    BlankNode::new_from_unique_id(u128::from(hasher.finish()))
                }),
            )),
            NodeType::Literal {
                language: Some(language),
                ..
            } => Literal::new_language_tagged_literal(value, language)
                .ok()
                .map(Term::Literal),
            NodeType::Literal {
                datatype: Some(datatype),
                ..
            } => {
                let value = if datatype.as_ref() == xsd::BOOLEAN {
                    let is_true = value
                        .parse::<i64>()
                        .map_or_else(|_| value.eq_ignore_ascii_case("true"), |v| v != 0);
                    (if is_true { "true" } else { "false" }).to_owned()
                } else if datatype.as_ref() == xsd::DATE_TIME {
                    value.replacen(' ', "T", 1)
                } else {
                    value.to_owned()
                };
                is_valid_lexical_form(datatype.as_ref(), &value)
                    .then(|| Term::Literal(Literal::new_typed_literal(value, datatype.clone())))
            }
            NodeType::Literal { .. } => Some(Term::Literal(Literal::new_simple_literal(value))),
        }
    }

    pub fn describe_self(&self, filter: &mut dyn NodeSetFilter) {
        match self {
            NodeType::Iri => filter.limit_to_iris(),
            NodeType::BlankNode => filter.limit_to_blank_nodes(),
            NodeType::Literal { language, datatype } => {
                filter.limit_to_literals(language.as_deref(), datatype.as_ref());
            }
        }
    }
}

/// The language and the datatype of a literal as used by [`NodeType::Literal`].
pub(crate) fn literal_shape(literal: LiteralRef<'_>) -> (Option<String>, Option<NamedNode>) {
    match literal.language() {
        Some(language) => (Some(language.to_ascii_lowercase()), None),
        None if literal.datatype() == xsd::STRING => (None, None),
        None => (None, Some(literal.datatype().into_owned())),
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeType::Iri => f.write_str("URI"),
            NodeType::BlankNode => f.write_str("Blank"),
            NodeType::Literal { language, datatype } => {
                f.write_str("Literal")?;
                if let Some(language) = language {
                    write!(f, "@{language}")?;
                }
                if let Some(datatype) = datatype {
                    write!(f, "^^{datatype}")?;
                }
                Ok(())
            }
        }
    }
}
