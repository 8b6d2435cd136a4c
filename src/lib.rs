/**
 * STUN (RFC 5389) message codec and client transaction engine
 *
 * - `stun`: wire format, attributes, FINGERPRINT and MESSAGE-INTEGRITY
 * - `cache`: concurrent cache with time-to-live and idle expiry
 * - `client`: request/retransmit/reply correlation
 * - `net`: UDP transport for the client
 */
use slog::Logger;

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod net;
pub mod stun;
mod utils;

pub use client::{Outcome, PacketSender, ResultHandle, StunClient, StunResult};
pub use error::{StunError, TransactionError};
pub use stun::packet::{is_stun_packet, StunPacket};

/**
 * Represents the shared context.
 *
 * Fields:
 * - `config`: The configuration settings.
 * - `logger`: The root logger instance.
 */
#[derive(Debug)]
pub struct Context {
    pub config: config::Settings,
    pub logger: Logger,
}

impl Context {
    /// Load the configuration and set up logging from it
    pub fn from_environment() -> Result<Self, ::config::ConfigError> {
        let config = config::Settings::new()?;
        let logger = logging::init_logger(&config);
        Ok(Self { config, logger })
    }
}
