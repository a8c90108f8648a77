//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Approval workflow configuration.
    #[serde(default)]
    pub workflow: WorkflowConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Approval workflow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Capacity of the status-change event channel.
    ///
    /// Subscribers that fall further behind than this lose the oldest events.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_event_buffer() -> usize {
    256
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "spendflow=debug,sea_orm=warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `SPENDFLOW__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("SPENDFLOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment_with_defaults() {
        temp_env::with_vars(
            [
                ("SPENDFLOW__DATABASE__URL", Some("sqlite::memory:")),
                ("SPENDFLOW__WORKFLOW__EVENT_BUFFER", None::<&str>),
                ("RUN_MODE", Some("test")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.database.url, "sqlite::memory:");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.database.min_connections, 1);
                assert_eq!(config.workflow.event_buffer, 256);
                assert_eq!(config.logging.filter, "spendflow=debug,sea_orm=warn");
            },
        );
    }

    #[test]
    fn test_load_overrides_workflow_settings() {
        temp_env::with_vars(
            [
                ("SPENDFLOW__DATABASE__URL", Some("postgres://localhost/spendflow")),
                ("SPENDFLOW__DATABASE__MAX_CONNECTIONS", Some("4")),
                ("SPENDFLOW__WORKFLOW__EVENT_BUFFER", Some("16")),
                ("RUN_MODE", Some("test")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.database.max_connections, 4);
                assert_eq!(config.workflow.event_buffer, 16);
            },
        );
    }

    #[test]
    fn test_load_fails_without_database_url() {
        temp_env::with_vars(
            [
                ("SPENDFLOW__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("test")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
