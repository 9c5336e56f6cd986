#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] billsim_core::ConfigError),

    #[error(transparent)]
    Db(#[from] billsim_db::DbError),

    #[error(transparent)]
    Query(#[from] billsim_index::QueryError),

    #[error(transparent)]
    Parse(#[from] billsim_parser::ParseError),

    #[error(transparent)]
    Comparator(#[from] billsim_comparator::ComparatorError),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl CliError {
    /// Maps this error onto the process exit code it should produce:
    /// configuration errors exit 2, everything else exits 1.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            _ => 1,
        }
    }
}
