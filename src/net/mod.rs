/**
 * Network related functionality
 *
 * A UDP socket shared by the client for sending requests and by a receive task
 * that hands every datagram to `StunClient::store_and_notify`.
 */
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use slog::{debug, error, Logger};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::{PacketSender, StunClient};
use crate::{logging, Context};

/// Largest possible UDP payload, so no datagram is ever cut short
const RECEIVE_BUFFER_SIZE: usize = 65535;

/// A datagram that turned out not to be STUN, with its sender
pub type Datagram = (Vec<u8>, SocketAddr);

#[derive(Clone)]
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    logger: Logger,
}

impl UdpTransport {
    /**
     * Bind to the configured `bind_address`
     */
    pub async fn bind(context: &Arc<Context>) -> io::Result<Self> {
        let socket = UdpSocket::bind(&context.config.bind_address).await?;
        Ok(Self::from_socket(context, socket))
    }

    pub fn from_socket(context: &Arc<Context>, socket: UdpSocket) -> Self {
        Self {
            socket: Arc::new(socket),
            logger: logging::component(&context.logger, "net"),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /**
     * Spawns the receive loop. Datagrams that are not STUN are forwarded to
     * `passthrough` when one is given and dropped otherwise.
     *
     * The loop ends on a socket error or when the client is dropped.
     */
    pub fn spawn_receiver<S: PacketSender>(
        &self,
        client: &Arc<StunClient<S>>,
        passthrough: Option<mpsc::UnboundedSender<Datagram>>,
    ) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let logger = self.logger.clone();
        let client = Arc::downgrade(client);

        tokio::spawn(async move {
            let mut buffer = vec![0u8; RECEIVE_BUFFER_SIZE];
            loop {
                let (n, from) = match socket.recv_from(&mut buffer).await {
                    Ok(received) => received,
                    Err(e) => {
                        error!(logger, "UDP receive error: {}", e);
                        break;
                    }
                };
                let client = match client.upgrade() {
                    Some(client) => client,
                    None => break,
                };

                if client.store_and_notify(&buffer[..n], from) {
                    continue;
                }
                match &passthrough {
                    Some(tx) => {
                        let _ = tx.send((buffer[..n].to_vec(), from));
                    }
                    None => debug!(logger, "dropped {} byte non-STUN datagram from {}", n, from),
                }
            }
        })
    }
}

#[async_trait]
impl PacketSender for UdpTransport {
    async fn send_packet(&self, data: &[u8], destination: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(data, destination).await
    }
}
