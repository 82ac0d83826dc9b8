use anyhow::{Context, Result};
use placement_core::{EngineConfig, SearchBudget, DEFAULT_MAX_GRID_SIZE};
use std::str::FromStr;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TIME_LIMIT_MS: u64 = 5000;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub rust_log: String,
    pub engine: EngineConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let budget = SearchBudget {
            max_partitions: parse_var(&lookup, "PLACEMENT_MAX_PARTITIONS")?,
            max_candidates: parse_var(&lookup, "PLACEMENT_MAX_CANDIDATES")?,
            time_limit_ms: parse_var(&lookup, "PLACEMENT_TIME_LIMIT_MS")?
                .unwrap_or(DEFAULT_TIME_LIMIT_MS),
        };

        Ok(ApiConfig {
            port: parse_var(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT),
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            engine: EngineConfig::new().with_budget(budget).with_max_grid_size(
                parse_var(&lookup, "PLACEMENT_MAX_GRID_SIZE")?.unwrap_or(DEFAULT_MAX_GRID_SIZE),
            ),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} must be a valid number, got '{raw}'"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.engine.budget.time_limit_ms, 5000);
        assert_eq!(config.engine.budget.max_candidates, None);
        assert_eq!(config.engine.max_grid_size, DEFAULT_MAX_GRID_SIZE);
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("PLACEMENT_MAX_CANDIDATES", "1000"),
            ("PLACEMENT_TIME_LIMIT_MS", "0"),
            ("PLACEMENT_MAX_GRID_SIZE", "8"),
        ]))
        .unwrap();
        assert_eq!(config.engine.max_grid_size, 8);
        assert_eq!(config.port, 8080);
        assert_eq!(config.engine.budget.max_candidates, Some(1000));
        assert_eq!(config.engine.budget.time_limit(), None);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = ApiConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
