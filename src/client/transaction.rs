/**
 * Per-request transaction state and the handle returned to callers
 *
 * A transaction is resolved exactly once. The first of reply, failure, timeout
 * or cancellation wins; later attempts to resolve it are ignored.
 */
use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::watch;

use crate::config::Compliance;
use crate::error::TransactionError;
use crate::stun::attribute::{Attribute, AttributeType, ErrorCode};
use crate::stun::header::{Class, TransactionId};
use crate::stun::packet::StunPacket;

/// How a transaction ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A reply arrived. Error responses land here too, see `StunResult::success`.
    Response(StunResult),
    /// Sending failed, nothing more was attempted
    Failure(TransactionError),
    /// Every retransmission went unanswered
    TimedOut,
    /// Cancelled through the result handle
    Cancelled,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Response(result) if result.success)
    }

    pub fn result(&self) -> Option<&StunResult> {
        match self {
            Outcome::Response(result) => Some(result),
            _ => None,
        }
    }
}

/**
 * What the caller gets from a reply
 *
 * Fields:
 * - `success`: the reply was a success response
 * - `mapped_address`: reflexive address of a success response
 * - `error`: ERROR-CODE of an error response
 * - `fingerprint_valid`: `None` when the reply had no FINGERPRINT
 * - `integrity_valid`: `None` when the reply had no MESSAGE-INTEGRITY or no credentials are configured
 * - `source`: where the reply came from
 * - `packet`: the decoded reply, for access to every attribute
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StunResult {
    pub success: bool,
    pub mapped_address: Option<SocketAddr>,
    pub error: Option<ErrorCode>,
    pub fingerprint_valid: Option<bool>,
    pub integrity_valid: Option<bool>,
    pub source: SocketAddr,
    pub packet: StunPacket,
}

impl StunResult {
    /**
     * Interpret a decoded reply.
     *
     * XOR-MAPPED-ADDRESS is preferred. MAPPED-ADDRESS is only used in relaxed
     * mode, for servers that predate RFC 5389.
     */
    pub(crate) fn from_reply(
        packet: StunPacket,
        source: SocketAddr,
        compliance: Compliance,
        credentials: Option<(&str, &str, &str)>,
    ) -> Self {
        let success = packet.class == Class::Success;

        let mapped_address = if success {
            packet.xor_mapped_address().or_else(|| {
                if compliance.accepts_classic() {
                    packet.mapped_address()
                } else {
                    None
                }
            })
        } else {
            None
        };

        let error = if packet.class == Class::Error {
            packet.error_code().cloned()
        } else {
            None
        };

        let integrity_valid = match (packet.message_integrity(), credentials) {
            (Some(integrity), Some((username, realm, password))) => {
                Some(integrity.verify_hash(username, realm, password))
            }
            _ => None,
        };

        Self {
            success,
            mapped_address,
            error,
            fingerprint_valid: packet.fingerprint_valid(),
            integrity_valid,
            source,
            packet,
        }
    }

    pub fn attribute(&self, attr_type: AttributeType) -> Option<&Attribute> {
        self.packet.attribute(attr_type)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.packet.attributes
    }
}

/**
 * An outstanding request. Stored in the transaction cache under its ID and
 * shared with the retry task and every result handle.
 */
#[derive(Debug)]
pub(crate) struct PendingTransaction {
    id: TransactionId,
    destination: SocketAddr,
    state: watch::Sender<Option<Outcome>>,
}

impl PendingTransaction {
    pub(crate) fn new(id: TransactionId, destination: SocketAddr) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            id,
            destination,
            state,
        }
    }

    pub(crate) fn id(&self) -> TransactionId {
        self.id
    }

    pub(crate) fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Store the outcome unless one is already set. Returns whether this call won.
    pub(crate) fn resolve(&self, outcome: Outcome) -> bool {
        self.state.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome);
            true
        })
    }

    pub(crate) fn is_done(&self) -> bool {
        self.state.borrow().is_some()
    }

    pub(crate) fn outcome(&self) -> Option<Outcome> {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<Outcome>> {
        self.state.subscribe()
    }

    /// Wait until resolved
    pub(crate) async fn resolved(&self) -> Outcome {
        let mut receiver = self.subscribe();
        let outcome = match receiver.wait_for(Option::is_some).await {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        outcome.unwrap_or(Outcome::Failure(TransactionError::Interrupted))
    }
}

/// Two transactions are equal only if they are the same object, whatever their IDs
impl PartialEq for PendingTransaction {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for PendingTransaction {}

/**
 * Returned by `do_test`. Cloning gives another handle on the same transaction.
 */
#[derive(Debug, Clone)]
pub struct ResultHandle {
    pending: std::sync::Arc<PendingTransaction>,
}

impl ResultHandle {
    pub(crate) fn new(pending: std::sync::Arc<PendingTransaction>) -> Self {
        Self { pending }
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.pending.id()
    }

    pub fn destination(&self) -> SocketAddr {
        self.pending.destination()
    }

    /// Wait for the transaction to end
    pub async fn wait(&self) -> Outcome {
        self.pending.resolved().await
    }

    /// Like `wait`, `None` if nothing happened within `limit`
    pub async fn wait_timeout(&self, limit: Duration) -> Option<Outcome> {
        tokio::time::timeout(limit, self.wait()).await.ok()
    }

    /// The outcome if the transaction already ended
    pub fn try_result(&self) -> Option<Outcome> {
        self.pending.outcome()
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_done()
    }

    /**
     * End the transaction without a reply. Waiters wake up with `Outcome::Cancelled`
     * and no more retransmissions are sent. Returns false if it had already ended.
     */
    pub fn cancel(&self) -> bool {
        self.pending.resolve(Outcome::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stun::attribute::{create_mapped_address_attribute, create_xor_mapped_address_attribute};
    use crate::stun::header::Method;
    use std::sync::Arc;

    fn source() -> SocketAddr {
        "192.0.2.10:3478".parse().unwrap()
    }

    #[test]
    fn test_first_resolution_wins() {
        let pending = PendingTransaction::new(TransactionId::new(), source());
        assert!(!pending.is_done());
        assert!(pending.resolve(Outcome::TimedOut));
        assert!(!pending.resolve(Outcome::Cancelled));
        assert_eq!(pending.outcome(), Some(Outcome::TimedOut));
    }

    #[test]
    fn test_equality_is_identity() {
        let id = TransactionId::new();
        let first = Arc::new(PendingTransaction::new(id, source()));
        let second = Arc::new(PendingTransaction::new(id, source()));
        assert_ne!(first, second);
        assert_eq!(first, Arc::clone(&first));
    }

    #[tokio::test]
    async fn test_handle_wait_and_cancel() {
        let pending = Arc::new(PendingTransaction::new(TransactionId::new(), source()));
        let handle = ResultHandle::new(pending.clone());
        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.wait().await })
        };

        assert_eq!(handle.try_result(), None);
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert_eq!(waiter.await.unwrap(), Outcome::Cancelled);
        assert!(handle.is_done());
        assert_eq!(handle.wait().await, Outcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_timeout_expires() {
        let pending = Arc::new(PendingTransaction::new(TransactionId::new(), source()));
        let handle = ResultHandle::new(pending);
        assert_eq!(handle.wait_timeout(Duration::from_millis(10)).await, None);
    }

    #[test]
    fn test_result_prefers_xor_mapped_address() {
        let xor: SocketAddr = "203.0.113.5:40000".parse().unwrap();
        let plain: SocketAddr = "203.0.113.6:40001".parse().unwrap();
        let packet = StunPacket::new(Class::Success, Method::Binding, TransactionId::new())
            .with_attribute(create_mapped_address_attribute(plain))
            .with_attribute(create_xor_mapped_address_attribute(xor));

        let result = StunResult::from_reply(packet.clone(), source(), Compliance::Relaxed, None);
        assert!(result.success);
        assert_eq!(result.mapped_address, Some(xor));
        assert_eq!(result.fingerprint_valid, None);
        assert_eq!(result.integrity_valid, None);
        assert_eq!(result.attributes().len(), 2);
    }

    #[test]
    fn test_result_mapped_address_fallback_depends_on_compliance() {
        let plain: SocketAddr = "203.0.113.6:40001".parse().unwrap();
        let packet = StunPacket::new(Class::Success, Method::Binding, TransactionId::new())
            .with_attribute(create_mapped_address_attribute(plain));

        let relaxed = StunResult::from_reply(packet.clone(), source(), Compliance::Relaxed, None);
        assert_eq!(relaxed.mapped_address, Some(plain));

        let strict = StunResult::from_reply(packet, source(), Compliance::RFC5389, None);
        assert_eq!(strict.mapped_address, None);
    }

    #[test]
    fn test_result_error_response() {
        let packet = StunPacket::new(Class::Error, Method::Binding, TransactionId::new())
            .with_attribute(Attribute::error_code(401, "Unauthorized"))
            .with_attribute(Attribute::realm("example.org"));

        let result = StunResult::from_reply(packet, source(), Compliance::RFC5389, None);
        assert!(!result.success);
        assert_eq!(result.mapped_address, None);
        assert_eq!(result.error, Some(ErrorCode::new(401, "Unauthorized")));
        assert_eq!(
            result.attribute(AttributeType::Realm).and_then(Attribute::as_str),
            Some("example.org")
        );
        assert!(!Outcome::Response(result).is_success());
    }
}
