use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL; DATABASE_URL takes precedence when set
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub db: DbSettings,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub worker: WorkerSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Connection pool sizing
///
/// The pool is shared by the gateway handlers and the settlement worker;
/// the worker holds one connection per in-flight database transaction and
/// never across the provider call, so a modest pool goes a long way.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DbSettings {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            max_connections: 20,
            acquire_timeout_secs: 5,
        }
    }
}

/// Settlement provider endpoint configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8010/".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Withdrawal settlement worker configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkerSettings {
    pub poll_interval_secs: u64,
    pub max_retries: u32,
    pub backoff_base_secs: u64,
    pub backoff_cap_secs: u64,
    /// Stop the current batch on the first transient provider failure and
    /// reschedule the whole invocation with backoff
    pub abort_batch_on_transient: bool,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            max_retries: 5,
            backoff_base_secs: 1,
            backoff_cap_secs: 300,
            abort_batch_on_transient: true,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_settings_default() {
        let settings = WorkerSettings::default();
        assert_eq!(settings.poll_interval_secs, 5);
        assert_eq!(settings.max_retries, 5);
        assert_eq!(settings.backoff_cap_secs, 300);
        assert!(settings.abort_batch_on_transient);
    }

    #[test]
    fn test_config_parses_with_defaults() {
        let yaml = r#"
log_level: "info"
log_dir: "./logs"
log_file: "test.log"
use_json: false
rotation: "never"
gateway:
  host: "127.0.0.1"
  port: 8080
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert!(config.postgres_url.is_none());
        assert_eq!(config.db.max_connections, 20);
        assert_eq!(config.provider.timeout_secs, 5);
        assert_eq!(config.worker.max_retries, 5);
    }

    #[test]
    fn test_db_settings_override() {
        let yaml = r#"
max_connections: 4
acquire_timeout_secs: 2
"#;
        let settings: DbSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.max_connections, 4);
        assert_eq!(settings.acquire_timeout_secs, 2);
    }
}
