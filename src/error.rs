/**
 * Error types for the STUN codec and the transaction engine
 */
use std::io;

use thiserror::Error;

/**
 * Errors raised while encoding or decoding STUN messages.
 *
 * A decode error means "this is not a valid STUN packet"; callers sharing a port
 * with other protocols are expected to fall through and treat the datagram as
 * ordinary payload.
 */
#[derive(Debug, Error)]
pub enum StunError {
    #[error("STUN buffer truncated: {0}")]
    Truncated(String),

    #[error("not a STUN message: {0}")]
    NotStun(String),

    #[error("malformed STUN attribute 0x{code:04x}: {reason}")]
    BadAttribute { code: u16, reason: String },

    #[error("STUN message too large: {0} bytes")]
    TooLarge(usize),

    #[error("output buffer too small, need {0} bytes")]
    BufferTooSmall(usize),

    #[error("MESSAGE-INTEGRITY has no key to sign with")]
    MissingKey,

    #[error("FINGERPRINT must be the last attribute")]
    FingerprintNotLast,
}

impl StunError {
    pub(crate) fn bad_attribute(code: u16, reason: impl Into<String>) -> Self {
        StunError::BadAttribute {
            code,
            reason: reason.into(),
        }
    }
}

/**
 * Why a transaction failed without a reply. Carried inside the transaction
 * outcome, so it has to be cheap to clone.
 */
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("send failed ({kind:?}): {message}")]
    Send { kind: io::ErrorKind, message: String },

    #[error("send did not complete in time")]
    SendTimeout,

    #[error("transaction task was interrupted")]
    Interrupted,

    #[error("request could not be encoded: {0}")]
    Encode(String),
}

impl From<io::Error> for TransactionError {
    fn from(e: io::Error) -> Self {
        TransactionError::Send {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl From<StunError> for TransactionError {
    fn from(e: StunError) -> Self {
        TransactionError::Encode(e.to_string())
    }
}
