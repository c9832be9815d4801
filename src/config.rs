use std::time::Duration;

use crate::championships::RolloverConfig;

/// Runtime settings, read once from the environment at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    /// PostgreSQL URL; the in-memory store is used when unset
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub rollover_enabled: bool,
    pub rollover: RolloverConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults for
    /// missing or unparsable values
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RolloverConfig::default();

        let check_interval = lookup("ROLLOVER_CHECK_INTERVAL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.check_interval);

        Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            rollover_enabled: lookup("ROLLOVER_ENABLED")
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
            rollover: RolloverConfig {
                check_interval,
                awarded_by: lookup("ROLLOVER_AWARDED_BY").unwrap_or(defaults.awarded_by),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_variables() {
        let config = config_from(&[]);
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert!(config.database_url.is_none());
        assert_eq!(config.database_max_connections, 5);
        assert!(config.rollover_enabled);
        assert_eq!(config.rollover.check_interval, Duration::from_secs(3600));
        assert_eq!(config.rollover.awarded_by, "system");
    }

    #[test]
    fn variables_override_defaults() {
        let config = config_from(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/globalscore"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("ROLLOVER_ENABLED", "false"),
            ("ROLLOVER_CHECK_INTERVAL_SECS", "60"),
            ("ROLLOVER_AWARDED_BY", "cron"),
        ]);
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/globalscore")
        );
        assert_eq!(config.database_max_connections, 12);
        assert!(!config.rollover_enabled);
        assert_eq!(config.rollover.check_interval, Duration::from_secs(60));
        assert_eq!(config.rollover.awarded_by, "cron");
    }

    #[rstest]
    #[case("-5")]
    #[case("0")]
    #[case("hourly")]
    fn unparsable_values_fall_back(#[case] check_interval: &str) {
        let config = config_from(&[
            ("DATABASE_MAX_CONNECTIONS", "many"),
            ("ROLLOVER_CHECK_INTERVAL_SECS", check_interval),
            ("DATABASE_URL", "  "),
        ]);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.rollover.check_interval, Duration::from_secs(3600));
        assert!(config.database_url.is_none());
    }
}
