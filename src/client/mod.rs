/**
 * STUN client transactions
 *
 * `do_test` sends a Binding request and retransmits it on the RFC 5389 section
 * 7.2.1 schedule (rto, 2*rto, 4*rto, ...) from a task of its own, so probes never
 * wait on each other. Whatever receives datagrams hands them to `store_and_notify`,
 * which matches replies to pending transactions by transaction ID.
 */
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use slog::{debug, trace, warn, Logger};
use tokio::time::timeout;

use crate::cache::ExpiringCache;
use crate::error::TransactionError;
use crate::logging;
use crate::stun::attribute::{create_fingerprint_attribute, Attribute};
use crate::stun::header::TransactionId;
use crate::stun::packet::StunPacket;
use crate::{utils, Context};

mod transaction;

pub use transaction::{Outcome, ResultHandle, StunResult};
use transaction::PendingTransaction;

/**
 * Outbound side of the transport. The engine only ever sends; inbound packets
 * come back through `StunClient::store_and_notify`.
 */
#[async_trait]
pub trait PacketSender: Send + Sync + 'static {
    async fn send_packet(&self, data: &[u8], destination: SocketAddr) -> io::Result<usize>;
}

type TransactionCache = ExpiringCache<TransactionId, Arc<PendingTransaction>>;

pub struct StunClient<S: PacketSender> {
    context: Arc<Context>,
    logger: Logger,
    sender: Arc<S>,
    transactions: Arc<TransactionCache>,
}

impl<S: PacketSender> StunClient<S> {
    /**
     * Creates a new client. Must be called from within a tokio runtime, the
     * transaction cache sweeper is spawned on it.
     *
     * @param context Shared configuration and logger
     * @param sender Transport used for requests and retransmissions
     */
    pub fn new(context: &Arc<Context>, sender: Arc<S>) -> Self {
        let config = &context.config;
        Self {
            context: Arc::clone(context),
            logger: logging::component(&context.logger, "client"),
            sender,
            transactions: ExpiringCache::with_sweep(
                config.transaction_ttl(),
                config.transaction_idle(),
                config.sweep_interval(),
            ),
        }
    }

    /**
     * A Binding request as configured: SOFTWARE, long-term credentials and
     * FINGERPRINT are added when enabled.
     */
    pub fn binding_request(&self) -> StunPacket {
        let config = &self.context.config;
        let mut request = StunPacket::binding_request();

        if !config.software_name.is_empty() {
            request.add_attribute(Attribute::software(&config.software_name));
        }
        if let Some((username, realm, password)) = config.credentials() {
            request.add_attribute(Attribute::username(username));
            request.add_attribute(Attribute::realm(realm));
            request.add_attribute(Attribute::message_integrity(username, realm, password));
        }
        if config.fingerprint {
            request.add_attribute(create_fingerprint_attribute());
        }
        request
    }

    /// Probe `server` with a Binding request
    pub fn do_test(&self, server: SocketAddr) -> ResultHandle {
        self.do_test_with(server, self.binding_request())
    }

    /**
     * Send a caller-built request to `server` and track it until it is answered,
     * fails, times out or is cancelled.
     *
     * Never fails directly: a request that cannot be encoded gives a handle that
     * is already resolved with `TransactionError::Encode`.
     */
    pub fn do_test_with(&self, server: SocketAddr, request: StunPacket) -> ResultHandle {
        let id = request.transaction_id;
        let pending = Arc::new(PendingTransaction::new(id, server));
        let handle = ResultHandle::new(Arc::clone(&pending));

        let bytes = match request.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(self.logger, "[{}] request could not be encoded: {}", id, e);
                pending.resolve(Outcome::Failure(e.into()));
                return handle;
            }
        };

        if let Some(previous) = self.transactions.admit(id, Arc::clone(&pending)) {
            if previous.resolve(Outcome::Cancelled) {
                warn!(self.logger, "[{}] transaction ID reused, cancelled the older request", id);
            }
        }

        trace!(
            self.logger,
            "-->-- [{}] {}: {}",
            id,
            server,
            utils::hex_encode_delimited(&bytes)
        );

        let config = &self.context.config;
        let retransmit = Retransmit {
            rto: config.rto(),
            max_retries: config.max_retries,
            send_timeout: config.send_timeout(),
        };
        tokio::spawn(run_transaction(
            Arc::clone(&self.sender),
            pending,
            bytes,
            retransmit,
            self.logger.clone(),
        ));

        handle
    }

    /**
     * Feed an inbound datagram to the engine.
     *
     * A response whose transaction ID matches a pending transaction resolves it.
     * Unmatched, duplicate and non-response STUN messages are logged and dropped.
     *
     * @return false if the datagram is not STUN and should be handled elsewhere
     */
    pub fn store_and_notify(&self, bytes: &[u8], from: SocketAddr) -> bool {
        let packet = match StunPacket::decode(bytes) {
            Ok(packet) => packet,
            Err(e) => {
                trace!(self.logger, "{} bytes from {} are not STUN: {}", bytes.len(), from, e);
                return false;
            }
        };
        let id = packet.transaction_id;
        let config = &self.context.config;

        trace!(
            self.logger,
            "--<-- [{}] {}: {}",
            id,
            from,
            utils::hex_encode_delimited(bytes)
        );

        if !packet.is_rfc5389() && !config.compliance.accepts_classic() {
            debug!(self.logger, "[{}] no magic cookie, dropped ({})", id, config.compliance.as_str());
            return false;
        }

        if !packet.class.is_response() {
            debug!(self.logger, "[{}] {:?} from {} is not a response, ignored", id, packet.class, from);
            return true;
        }

        let pending = match self.transactions.recover(&id) {
            Some(pending) => pending,
            None => {
                debug!(self.logger, "[{}] no pending transaction, reply from {} dropped", id, from);
                return true;
            }
        };

        if pending.destination() != from {
            debug!(
                self.logger,
                "[{}] reply from {} for a request sent to {}",
                id,
                from,
                pending.destination()
            );
        }

        let result = StunResult::from_reply(
            packet,
            from,
            config.compliance,
            config.credentials(),
        );
        if !pending.resolve(Outcome::Response(result)) {
            debug!(self.logger, "[{}] duplicate reply from {} ignored", id, from);
        }
        true
    }

    /// Number of transactions still held by the cache, finished ones included until they expire
    pub fn pending_count(&self) -> usize {
        self.transactions.len()
    }
}

#[derive(Debug, Clone, Copy)]
struct Retransmit {
    rto: std::time::Duration,
    max_retries: u32,
    send_timeout: std::time::Duration,
}

/**
 * Send, wait, double the wait, repeat. A send error ends the transaction at once;
 * running out of attempts ends it as timed out.
 *
 * The cache entry is left alone: the ID may already belong to a newer request,
 * and finished entries go away with the cache timeouts.
 */
async fn run_transaction<S: PacketSender>(
    sender: Arc<S>,
    pending: Arc<PendingTransaction>,
    bytes: Vec<u8>,
    retransmit: Retransmit,
    logger: Logger,
) {
    let id = pending.id();
    let destination = pending.destination();
    let mut state = pending.subscribe();
    let mut wait = retransmit.rto;

    for attempt in 0..retransmit.max_retries {
        if pending.is_done() {
            break;
        }
        if attempt > 0 {
            debug!(logger, "[{}] retransmit {} to {}", id, attempt, destination);
        }

        match timeout(retransmit.send_timeout, sender.send_packet(&bytes, destination)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                warn!(logger, "[{}] send to {} failed: {}", id, destination, e);
                pending.resolve(Outcome::Failure(TransactionError::from(e)));
                break;
            }
            Err(_) => {
                warn!(logger, "[{}] send to {} timed out", id, destination);
                pending.resolve(Outcome::Failure(TransactionError::SendTimeout));
                break;
            }
        }

        let resolved = match timeout(wait, state.wait_for(Option::is_some)).await {
            Ok(Ok(_)) => true,
            Ok(Err(_)) => {
                pending.resolve(Outcome::Failure(TransactionError::Interrupted));
                true
            }
            Err(_) => false,
        };
        if resolved {
            break;
        }
        wait *= 2;
    }

    if pending.resolve(Outcome::TimedOut) {
        debug!(logger, "[{}] no reply from {} after {} attempts", id, destination, retransmit.max_retries);
    }
}
