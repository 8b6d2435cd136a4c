/**
 * The deployment environment the probe runs in. It picks the environment-specific
 * config file and the default log level.
 *
 * Accepted spellings: `development`/`dev`, `staging`/`stg`, `production`/`prod`.
 * Anything else is treated as production.
 */
use std::env;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use slog::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum EnvironmentType {
    development,
    staging,
    production,
}

impl FromStr for EnvironmentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(EnvironmentType::development),
            "staging" | "stg" => Ok(EnvironmentType::staging),
            _ => Ok(EnvironmentType::production),
        }
    }
}

impl EnvironmentType {
    /// Read from STUN_ENVIRONMENT, production when unset
    pub fn from_env() -> Self {
        env::var(super::ENVIRONMENT_VARIABLE)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(EnvironmentType::production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentType::development => "development",
            EnvironmentType::staging => "staging",
            EnvironmentType::production => "production",
        }
    }

    /// Log level used when none is configured
    pub fn default_log_level(&self) -> Level {
        match self {
            EnvironmentType::development => Level::Debug,
            EnvironmentType::staging | EnvironmentType::production => Level::Warning,
        }
    }
}

impl<'de> Deserialize<'de> for EnvironmentType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(EnvironmentType::from_str(&s).unwrap_or(EnvironmentType::production))
    }
}
