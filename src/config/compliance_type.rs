use serde::de::{self, Visitor};
use serde::Deserializer;
use std::fmt;

/**
 * How strictly inbound replies are checked
 */
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Compliance {
    /**
     * Also accepts RFC 3489 servers: replies without the magic cookie are processed and
     * MAPPED-ADDRESS is used when XOR-MAPPED-ADDRESS is missing
     * https://datatracker.ietf.org/doc/html/rfc3489
     */
    Relaxed,
    /**
     * Replies must carry the magic cookie, anything else is dropped
     * https://datatracker.ietf.org/doc/html/rfc5389
     */
    #[default]
    RFC5389,
}

impl Compliance {
    /**
     * Returns the string representation of the compliance level.
     *
     * @return A string slice representing the compliance level.
     */
    pub fn as_str(&self) -> &'static str {
        match *self {
            Compliance::Relaxed => "Relaxed",
            Compliance::RFC5389 => "RFC5389",
        }
    }

    /// Whether a reply without the magic cookie may still resolve a transaction
    pub fn accepts_classic(&self) -> bool {
        *self == Compliance::Relaxed
    }
}

impl std::str::FromStr for Compliance {
    type Err = ();

    /**
     * Parse a string into a `Compliance` enum, unknown values fall back to RFC5389.
     */
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relaxed" => Ok(Compliance::Relaxed),
            _ => Ok(Compliance::RFC5389),
        }
    }
}

/**
 * Deserialize the compliance level from the configuration file.
 *
 * Anything that is not a recognized compliance level is treated as RFC5389.
 */
pub fn deserialize<'de, D>(deserializer: D) -> Result<Compliance, D::Error>
where
    D: Deserializer<'de>,
{
    match deserializer.deserialize_str(ComplianceVisitor) {
        Ok(c) => Ok(c),
        Err(_) => Ok(Compliance::RFC5389),
    }
}

struct ComplianceVisitor;

impl<'de> Visitor<'de> for ComplianceVisitor {
    type Value = Compliance;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string representing a compliance level")
    }

    fn visit_str<E>(self, value: &str) -> Result<Compliance, E>
    where
        E: de::Error,
    {
        Ok(value.parse().unwrap_or_default())
    }
}
