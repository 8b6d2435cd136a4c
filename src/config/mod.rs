/**
 * Initialize probe configuration, using hierarchical configuration
 * https://docs.rs/config/latest/config/
 *
 * 1. First stun.yaml is read
 * 2. Then stun.{environment}.yaml is read
 * 3. Then stun.local.yaml is read (this is normally used for dev and not checked in git)
 * 4. Finally, environment variables prefixed with STUN_ are read
 */
use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub mod compliance_type;
pub mod environment_type;
mod loglevel_type;

pub use compliance_type::Compliance;
pub use environment_type::EnvironmentType;

/// Environment variable selecting the environment-specific config file
pub(crate) const ENVIRONMENT_VARIABLE: &str = "STUN_ENVIRONMENT";

/**
 * Represents the configuration settings for the STUN client.
 *
 * Fields:
 * - `environment`: The environment type (e.g., development, staging, or production).
 * - `bind_address`: Local UDP address the client sends from (hostname:port format)
 * - `servers`: STUN servers to probe (hostname:port format)
 * - `software_name`: Sent in the SOFTWARE attribute of requests; empty to leave it out.
 * - `log_level`: The logging level. By default, logging is inferred from environment type if no other settings are found.
 * - `compliance`: How strictly replies are checked. By default, RFC5389 is used.
 * - `rto_ms`, `max_retries`: Retransmission schedule, waits are rto, 2*rto, 4*rto, ...
 * - `send_timeout_ms`: How long a single send may take before the transaction fails.
 * - `transaction_ttl_ms`, `transaction_idle_ms`, `sweep_interval_ms`: Pending transaction cache timing.
 * - `fingerprint`: Append FINGERPRINT to requests.
 * - `username`, `realm`, `password`: Long-term credentials; requests are signed when all three are set.
 */
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: EnvironmentType,
    pub bind_address: String,
    pub servers: Vec<String>,
    pub software_name: String,
    #[serde(deserialize_with = "compliance_type::deserialize")]
    pub compliance: Compliance,
    #[serde(deserialize_with = "loglevel_type::deserialize")]
    pub log_level: slog::Level,
    pub rto_ms: u64,
    pub max_retries: u32,
    pub send_timeout_ms: u64,
    pub transaction_ttl_ms: u64,
    pub transaction_idle_ms: u64,
    pub sweep_interval_ms: u64,
    pub fingerprint: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub realm: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var(ENVIRONMENT_VARIABLE).unwrap_or_else(|_| "production".into());
        let environment = EnvironmentType::from_env();

        let s = Config::builder()
            // default config file
            .add_source(File::with_name("stun.yaml").required(false))
            // environment-based config file
            .add_source(File::with_name(&format!("stun.{run_mode}.yaml")).required(false))
            // local config file (don't check this into source control)
            .add_source(File::with_name("stun.local.yaml").required(false))
            .add_source(
                Environment::with_prefix("STUN")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("servers"),
            )
            .set_default("bind_address", "0.0.0.0:0")?
            .set_default("servers", vec!["stun.l.google.com:19302"])?
            .set_default("compliance", Compliance::RFC5389.as_str())?
            .set_default(
                "log_level",
                loglevel_type::level_name(environment.default_log_level()),
            )?
            .set_default("environment", EnvironmentType::production.as_str())?
            .set_default("software_name", "SYN_PROBE/1")?
            .set_default("rto_ms", 500)?
            .set_default("max_retries", 7)?
            .set_default("send_timeout_ms", 1000)?
            .set_default("transaction_ttl_ms", 70_000)?
            .set_default("transaction_idle_ms", 70_000)?
            .set_default("sweep_interval_ms", 1000)?
            .set_default("fingerprint", true)?
            .build()?;

        s.try_deserialize()
    }

    pub fn rto(&self) -> Duration {
        Duration::from_millis(self.rto_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn transaction_ttl(&self) -> Duration {
        Duration::from_millis(self.transaction_ttl_ms)
    }

    pub fn transaction_idle(&self) -> Duration {
        Duration::from_millis(self.transaction_idle_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Username, realm and password, only when all three are configured
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        match (&self.username, &self.realm, &self.password) {
            (Some(username), Some(realm), Some(password)) => {
                Some((username.as_str(), realm.as_str(), password.as_str()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn set_env_var(key: &str, value: &str) {
        env::set_var(key, value);
    }

    fn reset_env_var() {
        let v = env::vars().collect::<Vec<(String, String)>>();
        for (name, _) in v {
            if name.starts_with("STUN_") {
                env::remove_var(name);
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        reset_env_var();
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(settings.bind_address, "0.0.0.0:0");
        assert_eq!(settings.servers, vec!["stun.l.google.com:19302".to_string()]);
        assert_eq!(settings.software_name, "SYN_PROBE/1");
        assert_eq!(settings.rto(), Duration::from_millis(500));
        assert_eq!(settings.max_retries, 7);
        assert_eq!(settings.send_timeout(), Duration::from_secs(1));
        assert_eq!(settings.transaction_ttl(), Duration::from_secs(70));
        assert_eq!(settings.transaction_idle(), Duration::from_secs(70));
        assert_eq!(settings.sweep_interval(), Duration::from_secs(1));
        assert!(settings.fingerprint);
        assert!(settings.credentials().is_none());
        reset_env_var();
    }

    #[test]
    #[serial]
    fn test_environment_variable_dev() {
        reset_env_var();
        set_env_var("STUN_ENVIRONMENT", "development");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(
            settings.environment.as_str(),
            EnvironmentType::development.as_str()
        );
        reset_env_var();
    }

    #[test]
    #[serial]
    fn test_environment_variable_stg() {
        reset_env_var();
        set_env_var("STUN_ENVIRONMENT", "stg");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(
            settings.environment.as_str(),
            EnvironmentType::staging.as_str()
        );
        reset_env_var();
    }

    #[test]
    #[serial]
    fn test_environment_variable_garbage() {
        reset_env_var();
        set_env_var("STUN_ENVIRONMENT", "garbage");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(
            settings.environment.as_str(),
            EnvironmentType::production.as_str()
        );
        reset_env_var();
    }

    #[test]
    #[serial]
    fn test_servers_list() {
        reset_env_var();
        set_env_var("STUN_SERVERS", "127.0.0.1:3478,stun.example.org:19302");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(
            settings.servers,
            vec![
                "127.0.0.1:3478".to_string(),
                "stun.example.org:19302".to_string()
            ]
        );
        reset_env_var();
    }

    #[test]
    #[serial]
    fn test_retry_schedule_variables() {
        reset_env_var();
        set_env_var("STUN_RTO_MS", "100");
        set_env_var("STUN_MAX_RETRIES", "3");
        set_env_var("STUN_FINGERPRINT", "false");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(settings.rto(), Duration::from_millis(100));
        assert_eq!(settings.max_retries, 3);
        assert!(!settings.fingerprint);
        reset_env_var();
    }

    #[test]
    #[serial]
    fn test_bind_address_variable() {
        reset_env_var();
        set_env_var("STUN_BIND_ADDRESS", "127.0.0.1:5678");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(settings.bind_address, "127.0.0.1:5678");
        reset_env_var();
    }

    #[test]
    #[serial]
    fn test_credentials_need_all_three() {
        reset_env_var();
        set_env_var("STUN_USERNAME", "user");
        set_env_var("STUN_REALM", "example.org");
        let settings = Settings::new().expect("Deserialization failed");
        assert!(settings.credentials().is_none());

        set_env_var("STUN_PASSWORD", "secret");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(
            settings.credentials(),
            Some(("user", "example.org", "secret"))
        );
        reset_env_var();
    }

    #[test]
    #[serial]
    fn test_log_level_combinations() {
        reset_env_var();

        set_env_var("STUN_ENVIRONMENT", "production");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(settings.log_level, slog::Level::Warning);

        reset_env_var();
        set_env_var("STUN_ENVIRONMENT", "development");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(settings.log_level, slog::Level::Debug);

        reset_env_var();
        set_env_var("STUN_ENVIRONMENT", "production");
        set_env_var("STUN_LOG_LEVEL", "trace");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(settings.log_level, slog::Level::Trace);

        reset_env_var();
        set_env_var("STUN_ENVIRONMENT", "development");
        set_env_var("STUN_LOG_LEVEL", "garbage");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(settings.log_level, slog::Level::Debug);

        reset_env_var();
        set_env_var("STUN_ENVIRONMENT", "staging");
        set_env_var("STUN_LOG_LEVEL", "garbage");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(settings.log_level, slog::Level::Warning);
        reset_env_var();
    }

    #[test]
    #[serial]
    fn test_compliance_values() {
        reset_env_var();
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(settings.compliance, Compliance::RFC5389);

        set_env_var("STUN_COMPLIANCE", "RelaxeD");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(settings.compliance, Compliance::Relaxed);

        set_env_var("STUN_COMPLIANCE", "rfc5389");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(settings.compliance, Compliance::RFC5389);

        set_env_var("STUN_COMPLIANCE", "garbage");
        let settings = Settings::new().expect("Deserialization failed");
        assert_eq!(settings.compliance, Compliance::RFC5389);
        reset_env_var();
    }
}
