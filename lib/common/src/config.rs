/// Options that change how a query is compiled.
///
/// Both options are off by default. Turning them on never changes the
/// solutions of a query, only the shape of the generated SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CompilerConfig {
    /// Enables alias adoption in the relation joiner, which removes self-joins
    /// on unique keys.
    pub use_all_optimizations: bool,
    /// Folds SPARQL filters into the `WHERE` clause of the generated SQL.
    pub filter_to_sql: bool,
}

impl CompilerConfig {
    #[must_use]
    pub fn with_all_optimizations(mut self, enabled: bool) -> Self {
        self.use_all_optimizations = enabled;
        self
    }

    #[must_use]
    pub fn with_filter_to_sql(mut self, enabled: bool) -> Self {
        self.filter_to_sql = enabled;
        self
    }
}
