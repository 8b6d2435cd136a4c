/**
 * syn-probe: asks every configured STUN server for our reflexive address
 */
use std::net::SocketAddr;
use std::sync::Arc;

use slog::{error, info, warn};
use syn_stun::net::UdpTransport;
use syn_stun::{Context, Outcome, StunClient};

/**
 * Resolve a `host:port` server name, preferring an address of the same family
 * as the local socket.
 */
async fn resolve(server: &str, local: SocketAddr) -> std::io::Result<Option<SocketAddr>> {
    let candidates: Vec<SocketAddr> = tokio::net::lookup_host(server).await?.collect();
    Ok(candidates
        .iter()
        .find(|candidate| candidate.is_ipv4() == local.is_ipv4())
        .or_else(|| candidates.first())
        .copied())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let context = Arc::new(Context::from_environment()?);
    let logger = &context.logger;

    let transport = Arc::new(UdpTransport::bind(&context).await?);
    let local = transport.local_addr()?;
    info!(logger, "Probing {} STUN server(s) from {}", context.config.servers.len(), local);

    let client = Arc::new(StunClient::new(&context, Arc::clone(&transport)));
    let receiver = transport.spawn_receiver(&client, None);

    let mut probes = Vec::new();
    for server in &context.config.servers {
        match resolve(server, local).await {
            Ok(Some(address)) => probes.push((server.clone(), client.do_test(address))),
            Ok(None) => warn!(logger, "{} did not resolve to any address", server),
            Err(e) => warn!(logger, "could not resolve {}: {}", server, e),
        }
    }

    for (server, handle) in probes {
        match handle.wait().await {
            Outcome::Response(result) if result.success => match result.mapped_address {
                Some(mapped) => info!(
                    logger,
                    "{} ({}) sees us as {}", server, result.source, mapped;
                    "fingerprint" => ?result.fingerprint_valid,
                    "integrity" => ?result.integrity_valid
                ),
                None => warn!(logger, "{} answered without a mapped address", server),
            },
            Outcome::Response(result) => match result.error {
                Some(e) => warn!(logger, "{} answered with error {} {}", server, e.code, e.reason),
                None => warn!(logger, "{} answered with an error response", server),
            },
            Outcome::Failure(e) => error!(logger, "{}: {}", server, e),
            Outcome::TimedOut => warn!(logger, "{}: no reply", server),
            Outcome::Cancelled => warn!(logger, "{}: cancelled", server),
        }
    }

    receiver.abort();
    Ok(())
}

/**
 * The main entry point for the application
 */
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("syn-probe: {}", e);
        std::process::exit(1);
    }
}
