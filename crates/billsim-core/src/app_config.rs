use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which on-disk bill-XML layout `PathResolver` should assume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathLayout {
    /// `<root>/<congress>/bills/<stage><number>/BILLS-<congress><stage><number><version>.xml`
    Flat,
    /// `<root>/<congress>/bills/<stage>/<stage><number>/text-versions/<version>/document.xml`
    Nested,
}

impl std::fmt::Display for PathLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathLayout::Flat => write!(f, "flat"),
            PathLayout::Nested => write!(f, "nested"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    Avg,
    Max,
    Sum,
}

impl std::fmt::Display for ScoreMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreMode::Avg => write!(f, "avg"),
            ScoreMode::Max => write!(f, "max"),
            ScoreMode::Sum => write!(f, "sum"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub data_root: PathBuf,
    pub path_layout: PathLayout,
    pub search_index_url: String,
    pub search_index_name: String,
    pub comparator_path: Option<PathBuf>,
    pub comparator_timeout_secs: u64,
    pub min_score_default: u32,
    pub score_mode: ScoreMode,
    pub max_bills_section: usize,
    pub worker_count: usize,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub log_level: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("data_root", &self.data_root)
            .field("path_layout", &self.path_layout)
            .field("search_index_url", &self.search_index_url)
            .field("search_index_name", &self.search_index_name)
            .field("comparator_path", &self.comparator_path)
            .field("comparator_timeout_secs", &self.comparator_timeout_secs)
            .field("min_score_default", &self.min_score_default)
            .field("score_mode", &self.score_mode)
            .field("max_bills_section", &self.max_bills_section)
            .field("worker_count", &self.worker_count)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .finish()
    }
}
