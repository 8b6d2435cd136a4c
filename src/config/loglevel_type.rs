use serde::de::{self, Deserializer, Visitor};

use slog::Level;
use std::fmt;

use super::environment_type::EnvironmentType;

/// Names accepted for `log_level`
pub(crate) const LEVEL_NAMES: &[&str] = &["trace", "debug", "info", "warn", "error", "critical"];

/// Lower-case name of a level, as written in the configuration
pub(crate) fn level_name(level: Level) -> &'static str {
    match level {
        Level::Trace => "trace",
        Level::Debug => "debug",
        Level::Info => "info",
        Level::Warning => "warn",
        Level::Error => "error",
        Level::Critical => "critical",
    }
}

/**
 * Deserialize the log level from the configuration.
 *
 * An unrecognized value falls back to the default of the current environment.
 */
pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
where
    D: Deserializer<'de>,
{
    match deserializer.deserialize_str(LogLevelVisitor) {
        Ok(level) => Ok(level),
        Err(_) => Ok(EnvironmentType::from_env().default_log_level()),
    }
}

struct LogLevelVisitor;

impl<'de> Visitor<'de> for LogLevelVisitor {
    type Value = Level;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string representing a log level")
    }

    fn visit_str<E>(self, value: &str) -> Result<Level, E>
    where
        E: de::Error,
    {
        let lowered = value.to_lowercase();
        [
            Level::Trace,
            Level::Debug,
            Level::Info,
            Level::Warning,
            Level::Error,
            Level::Critical,
        ]
        .into_iter()
        .find(|level| level_name(*level) == lowered)
        .ok_or_else(|| de::Error::unknown_variant(value, LEVEL_NAMES))
    }
}
