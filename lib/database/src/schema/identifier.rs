use rdb2rdf_common::{CompilationError, CompileResult};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::iter::Peekable;
use std::str::Chars;

/// An SQL identifier, such as the name of a table or column.
///
/// Undelimited identifiers are case-insensitive and compare by their upper-case form. Delimited
/// identifiers (`"name"`) are compared exactly.
#[derive(Debug, Clone)]
pub struct Identifier {
    name: String,
    delimited: bool,
    canonical: String,
}

impl Identifier {
    pub fn delimited(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            canonical: name.clone(),
            name,
            delimited: true,
        }
    }

    pub fn undelimited(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            canonical: name.to_uppercase(),
            name,
            delimited: false,
        }
    }

    /// The name as written, without quotes.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_delimited(&self) -> bool {
        self.delimited
    }

    /// The name used for comparisons.
    pub fn canonical_name(&self) -> &str {
        &self.canonical
    }

    /// Parses a single, unqualified identifier.
    pub fn parse(input: &str) -> CompileResult<Identifier> {
        let mut parts = Self::parse_qualified(input, 1, 1)?;
        parts.pop().ok_or_else(|| {
            CompilationError::invalid_identifier(input, "expected exactly one identifier")
        })
    }

    /// Parses a `.`-separated identifier with between `min_parts` and `max_parts` parts.
    pub fn parse_qualified(
        input: &str,
        min_parts: usize,
        max_parts: usize,
    ) -> CompileResult<Vec<Identifier>> {
        let mut parts = Vec::new();
        let mut chars = input.trim().chars().peekable();
        loop {
            parts.push(parse_part(input, &mut chars)?);
            match chars.next() {
                None => break,
                Some('.') => {}
                Some(c) => {
                    return Err(CompilationError::invalid_identifier(
                        input,
                        format!("unexpected character '{c}'"),
                    ))
                }
            }
        }

        if parts.len() < min_parts || parts.len() > max_parts {
            return Err(CompilationError::invalid_identifier(
                input,
                format!(
                    "expected between {min_parts} and {max_parts} parts, found {}",
                    parts.len()
                ),
            ));
        }
        Ok(parts)
    }
}

fn parse_part(input: &str, chars: &mut Peekable<Chars<'_>>) -> CompileResult<Identifier> {
    match chars.peek().copied() {
        None => Err(CompilationError::invalid_identifier(
            input,
            "empty identifier",
        )),
        Some('"') => {
            chars.next();
            let mut name = String::new();
            loop {
                match chars.next() {
                    None => {
                        return Err(CompilationError::invalid_identifier(
                            input,
                            "unterminated delimited identifier",
                        ))
                    }
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        name.push('"');
                    }
                    Some('"') => break,
                    Some(c) => name.push(c),
                }
            }
            if name.is_empty() {
                return Err(CompilationError::invalid_identifier(
                    input,
                    "empty delimited identifier",
                ));
            }
            Ok(Identifier::delimited(name))
        }
        Some(c) if c.is_alphabetic() || c == '_' => {
            let mut name = String::new();
            while let Some(c) = chars.next_if(|c| c.is_alphanumeric() || *c == '_' || *c == '$') {
                name.push(c);
            }
            Ok(Identifier::undelimited(name))
        }
        Some(c) => Err(CompilationError::invalid_identifier(
            input,
            format!("unexpected character '{c}'"),
        )),
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.delimited {
            write!(f, "\"{}\"", self.name.replace('"', "\"\""))
        } else {
            f.write_str(&self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undelimited_is_case_insensitive() {
        assert_eq!(Identifier::undelimited("papers"), Identifier::undelimited("PAPERS"));
        assert_eq!(Identifier::undelimited("papers"), Identifier::delimited("PAPERS"));
        assert_ne!(Identifier::delimited("papers"), Identifier::delimited("PAPERS"));
    }

    #[test]
    fn test_parse_qualified() {
        let parts = Identifier::parse_qualified("db.\"My \"\"Table\"\"\".col_1", 1, 3).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].name(), "My \"Table\"");
        assert!(parts[1].is_delimited());
        assert_eq!(parts[2].to_string(), "col_1");
    }

    #[test]
    fn test_parse_errors() {
        assert!(Identifier::parse("").is_err());
        assert!(Identifier::parse("a.b").is_err());
        assert!(Identifier::parse("\"open").is_err());
        assert!(Identifier::parse("1abc").is_err());
        assert!(Identifier::parse("a b").is_err());
        assert!(Identifier::parse("a.").is_err());
    }
}
