use std::env::VarError;
use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment, PathLayout, ScoreMode};
use crate::ConfigError;

/// Loads configuration from the real process environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a required variable is missing or a present
/// variable fails to parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    load_app_config(|key| std::env::var(key))
}

/// Loads configuration via an injected lookup function, so tests can supply
/// an in-memory map instead of mutating the process environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a required variable is missing or a present
/// variable fails to parse.
pub fn load_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    build_app_config(lookup)
}

fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let require = |key: &str| -> Result<String, ConfigError> {
        lookup(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
    };

    let or_default = |key: &str, default: &str| -> String {
        lookup(key).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |key: &str, default: u32| -> Result<u32, ConfigError> {
        match lookup(key) {
            Ok(raw) => raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
                var: key.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Ok(default),
        }
    };

    let parse_u64 = |key: &str, default: u64| -> Result<u64, ConfigError> {
        match lookup(key) {
            Ok(raw) => raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
                var: key.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Ok(default),
        }
    };

    let parse_usize = |key: &str, default: usize| -> Result<usize, ConfigError> {
        match lookup(key) {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|e| ConfigError::InvalidEnvVar {
                    var: key.to_string(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    };

    let parse_environment = |raw: &str| -> Result<Environment, ConfigError> {
        match raw.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::InvalidEnvVar {
                var: "BILLSIM_ENV".to_string(),
                reason: format!("unrecognized environment: {other}"),
            }),
        }
    };

    let parse_layout = |raw: &str| -> Result<PathLayout, ConfigError> {
        match raw.to_ascii_lowercase().as_str() {
            "flat" => Ok(PathLayout::Flat),
            "nested" => Ok(PathLayout::Nested),
            other => Err(ConfigError::InvalidEnvVar {
                var: "BILLSIM_PATH_LAYOUT".to_string(),
                reason: format!("unrecognized path layout: {other}"),
            }),
        }
    };

    let parse_score_mode = |raw: &str| -> Result<ScoreMode, ConfigError> {
        match raw.to_ascii_lowercase().as_str() {
            "avg" => Ok(ScoreMode::Avg),
            "max" => Ok(ScoreMode::Max),
            "sum" => Ok(ScoreMode::Sum),
            other => Err(ConfigError::InvalidEnvVar {
                var: "BILLSIM_SCORE_MODE".to_string(),
                reason: format!("unrecognized score mode: {other}"),
            }),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let data_root = PathBuf::from(require("BILLSIM_DATA_ROOT")?);
    let path_layout = parse_layout(&or_default("BILLSIM_PATH_LAYOUT", "flat"))?;
    let search_index_url = require("BILLSIM_SEARCH_INDEX_URL")?;
    let search_index_name = or_default("BILLSIM_SEARCH_INDEX_NAME", "sections");
    let comparator_path = lookup("BILLSIM_COMPARATOR_PATH").ok().map(PathBuf::from);
    let comparator_timeout_secs = parse_u64("BILLSIM_COMPARATOR_TIMEOUT_SECS", 30)?;
    let min_score_default = parse_u32("BILLSIM_MIN_SCORE_DEFAULT", 25)?;
    let score_mode = parse_score_mode(&or_default("BILLSIM_SCORE_MODE", "max"))?;
    let max_bills_section = parse_usize("BILLSIM_MAX_BILLS_SECTION", 100)?;
    let db_max_connections = parse_u32("DB_MAX_CONNECTIONS", 10)?;
    let db_min_connections = parse_u32("DB_MIN_CONNECTIONS", 1)?;
    let db_acquire_timeout_secs = parse_u64("DB_ACQUIRE_TIMEOUT_SECS", 10)?;
    let cpu_count = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(4);
    let default_workers = cpu_count.min(db_max_connections as usize);
    let worker_count = parse_usize("BILLSIM_WORKER_COUNT", default_workers)?;
    let log_level = or_default("LOG_LEVEL", "info");
    let env = parse_environment(&or_default("BILLSIM_ENV", "development"))?;

    if max_bills_section == 0 {
        return Err(ConfigError::Validation(
            "BILLSIM_MAX_BILLS_SECTION must be greater than zero".to_string(),
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        data_root,
        path_layout,
        search_index_url,
        search_index_name,
        comparator_path,
        comparator_timeout_secs,
        min_score_default,
        score_mode,
        max_bills_section,
        worker_count,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        log_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn mock_lookup(vars: HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Result<String, VarError> {
        move |key| {
            vars.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    fn base_vars() -> HashMap<&'static str, &'static str> {
        let mut vars = HashMap::new();
        vars.insert("DATABASE_URL", "postgres://localhost/billsim");
        vars.insert("BILLSIM_DATA_ROOT", "/data/congress");
        vars.insert("BILLSIM_SEARCH_INDEX_URL", "http://localhost:9200");
        vars
    }

    #[test]
    fn missing_required_var_is_reported() {
        let vars = HashMap::new();
        let err = load_app_config(mock_lookup(vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(v) if v == "DATABASE_URL"));
    }

    #[test]
    fn defaults_apply_when_optional_vars_absent() {
        let config = load_app_config(mock_lookup(base_vars())).unwrap();
        assert_eq!(config.path_layout, PathLayout::Flat);
        assert_eq!(config.score_mode, ScoreMode::Max);
        assert_eq!(config.max_bills_section, 100);
        assert_eq!(config.min_score_default, 25);
        assert!(config.comparator_path.is_none());
    }

    #[test]
    fn invalid_numeric_var_is_reported() {
        let mut vars = base_vars();
        vars.insert("BILLSIM_WORKER_COUNT", "not-a-number");
        let err = load_app_config(mock_lookup(vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { var, .. } if var == "BILLSIM_WORKER_COUNT"));
    }

    #[test]
    fn unrecognized_layout_is_reported() {
        let mut vars = base_vars();
        vars.insert("BILLSIM_PATH_LAYOUT", "sideways");
        let err = load_app_config(mock_lookup(vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { var, .. } if var == "BILLSIM_PATH_LAYOUT"));
    }

    #[test]
    fn zero_max_bills_section_fails_validation() {
        let mut vars = base_vars();
        vars.insert("BILLSIM_MAX_BILLS_SECTION", "0");
        let err = load_app_config(mock_lookup(vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
