use rdb2rdf_common::{CompilationError, CompileResult};
use rdb2rdf_database::renamer::Renamer;
use rdb2rdf_database::schema::TableName;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

static ALIAS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(.+)\s+AS\s+(.+?)\s*$").unwrap());

/// Maps table aliases to the tables they stand for.
///
/// Names that are not aliases map to themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AliasMap {
    originals: BTreeMap<TableName, TableName>,
}

impl AliasMap {
    /// Creates a map from `(alias, original)` pairs.
    pub fn new(aliases: impl IntoIterator<Item = (TableName, TableName)>) -> Self {
        Self {
            originals: aliases.into_iter().collect(),
        }
    }

    /// Parses an alias declaration of the form `Table AS Alias`.
    ///
    /// Returns the alias and the original table.
    pub fn parse_alias(declaration: &str) -> CompileResult<(TableName, TableName)> {
        let captures = ALIAS_PATTERN.captures(declaration).ok_or_else(|| {
            CompilationError::InvalidAlias(format!(
                "\"{declaration}\" is not in the form \"Table AS Alias\""
            ))
        })?;
        let original = TableName::parse(&captures[1])?;
        let alias = TableName::parse(&captures[2])?;
        if alias.is_qualified() {
            return Err(CompilationError::InvalidAlias(format!(
                "the alias in \"{declaration}\" must not be qualified"
            )));
        }
        Ok((alias, original))
    }

    /// Parses a list of `Table AS Alias` declarations.
    pub fn parse<'a>(declarations: impl IntoIterator<Item = &'a str>) -> CompileResult<Self> {
        let originals = declarations
            .into_iter()
            .map(Self::parse_alias)
            .collect::<CompileResult<_>>()?;
        Ok(Self { originals })
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    pub fn is_alias(&self, name: &TableName) -> bool {
        self.originals.contains_key(name)
    }

    /// Checks whether some alias stands for `original`.
    pub fn has_alias(&self, original: &TableName) -> bool {
        self.originals.values().any(|o| o == original)
    }

    /// The table `name` stands for.
    pub fn original_of(&self, name: &TableName) -> TableName {
        self.originals.get(name).unwrap_or(name).clone()
    }

    /// Iterates over the `(alias, original)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&TableName, &TableName)> {
        self.originals.iter()
    }

    /// Combines two maps. Entries of `other` win.
    #[must_use]
    pub fn merge(&self, other: &AliasMap) -> AliasMap {
        let mut originals = self.originals.clone();
        originals.extend(
            other
                .originals
                .iter()
                .map(|(alias, original)| (alias.clone(), original.clone())),
        );
        Self { originals }
    }

    /// Renames the aliases. The originals are kept.
    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> AliasMap {
        Self {
            originals: self
                .originals
                .iter()
                .map(|(alias, original)| (renamer.apply_to_table(alias), original.clone()))
                .collect(),
        }
    }
}

impl Display for AliasMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (alias, original) in &self.originals {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{original} AS {alias}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> TableName {
        TableName::parse(name).unwrap()
    }

    #[test]
    fn test_parse() {
        let aliases = AliasMap::parse(["people as Authors", "db.papers AS P"]).unwrap();
        assert!(aliases.is_alias(&table("Authors")));
        assert!(aliases.has_alias(&table("db.papers")));
        assert_eq!(aliases.original_of(&table("P")), table("db.papers"));
        assert_eq!(aliases.original_of(&table("people")), table("people"));
        insta::assert_snapshot!(aliases, @"people AS Authors, db.papers AS P");
    }

    #[test]
    fn test_invalid_declarations() {
        assert!(matches!(
            AliasMap::parse_alias("people Authors"),
            Err(CompilationError::InvalidAlias(_))
        ));
        assert!(matches!(
            AliasMap::parse_alias("people AS db.Authors"),
            Err(CompilationError::InvalidAlias(_))
        ));
    }

    #[test]
    fn test_rename_keeps_originals() {
        let aliases = AliasMap::new([(table("A"), table("people"))]);
        let renamed = aliases.rename(&Renamer::for_tables([(table("A"), table("B"))]));
        assert!(!renamed.is_alias(&table("A")));
        assert_eq!(renamed.original_of(&table("B")), table("people"));
    }

    #[test]
    fn test_merge() {
        let left = AliasMap::new([(table("A"), table("people"))]);
        let right = AliasMap::new([(table("B"), table("papers"))]);
        let merged = left.merge(&right);
        assert!(merged.is_alias(&table("A")));
        assert!(merged.is_alias(&table("B")));
    }
}
