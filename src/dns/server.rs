//! Relay server: accepts client datagrams and relays each one in its own task.

use crate::config::{LoggingConfig, RelaySettings};
use crate::dns::resolver::{Forwarder, UdpForwarder};
use crate::dns::rewrite::rewrite_query;
use crate::error::{RelayError, Stage};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Bind the listening socket and run the relay until a fatal error.
pub async fn run_relay_server(
    settings: RelaySettings,
    logging: LoggingConfig,
) -> Result<(), RelayError> {
    let socket = UdpSocket::bind(settings.listen)
        .await
        .map_err(|e| RelayError::transport(Stage::Bind, e))?;
    let forwarder = Arc::new(UdpForwarder::new(settings.max_datagram_size));

    serve(Arc::new(socket), Arc::new(settings), forwarder, logging.log_requests).await
}

/// Accept loop over an already bound socket.
///
/// Receive errors are logged and the loop keeps going. Each datagram is
/// copied into its own buffer before being handed to a request task.
pub async fn serve<F: Forwarder + 'static>(
    socket: Arc<UdpSocket>,
    settings: Arc<RelaySettings>,
    forwarder: Arc<F>,
    enable_logging: bool,
) -> Result<(), RelayError> {
    let local_addr = socket
        .local_addr()
        .map_err(|e| RelayError::transport(Stage::Bind, e))?;

    if enable_logging {
        info!(
            listen = %local_addr,
            upstream = %settings.upstream,
            suffix = %settings.suffix,
            timeout_ms = settings.upstream_timeout.as_millis() as u64,
            max_in_flight = settings.max_in_flight,
            "DNS relay started"
        );
    }

    // 0 = unlimited
    let in_flight = if settings.max_in_flight > 0 {
        Some(Arc::new(Semaphore::new(settings.max_in_flight)))
    } else {
        None
    };

    let mut buf = vec![0u8; settings.max_datagram_size];
    loop {
        let (len, client) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                if enable_logging {
                    error!(stage = %Stage::Receive, error = %e, "failed to read from client");
                }
                continue;
            }
        };

        let permit = match in_flight {
            Some(ref sem) => match Arc::clone(sem).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    if enable_logging {
                        warn!(
                            client = %client,
                            max_in_flight = settings.max_in_flight,
                            "dropping query: too many requests in flight"
                        );
                    }
                    continue;
                }
            },
            None => None,
        };

        let query = Bytes::copy_from_slice(&buf[..len]);
        let socket = Arc::clone(&socket);
        let settings = Arc::clone(&settings);
        let forwarder = Arc::clone(&forwarder);

        tokio::spawn(async move {
            // Held until the request finishes
            let _permit = permit;

            let result =
                relay_query(&*forwarder, &socket, query, client, &settings, enable_logging).await;
            if let Err(e) = result {
                if enable_logging {
                    error!(client = %client, stage = %e.stage(), error = %e, "DNS relay failed");
                }
            }
        });
    }
}

/// Run one query through rewrite, upstream exchange and reply.
pub async fn relay_query<F: Forwarder>(
    forwarder: &F,
    socket: &UdpSocket,
    query: Bytes,
    client: SocketAddr,
    settings: &RelaySettings,
    enable_logging: bool,
) -> Result<(), RelayError> {
    let response = handle_query(forwarder, &query, client, settings, enable_logging).await?;

    socket
        .send_to(&response, client)
        .await
        .map_err(|e| RelayError::transport(Stage::Reply, e))?;

    if enable_logging {
        debug!(client = %client, bytes = response.len(), "DNS response relayed");
    }
    Ok(())
}

/// Rewrite a client query and forward it, returning the upstream's bytes unchanged.
/// Made public for testing with mock forwarders.
pub async fn handle_query<F: Forwarder>(
    forwarder: &F,
    query: &[u8],
    client: SocketAddr,
    settings: &RelaySettings,
    enable_logging: bool,
) -> Result<Vec<u8>, RelayError> {
    let rewritten = rewrite_query(query, &settings.suffix)?;

    if enable_logging {
        info!(
            client = %client,
            name = %rewritten.original,
            forwarded = %rewritten.forwarded,
            "DNS query"
        );
    }

    forwarder
        .forward(
            &rewritten.message,
            settings.upstream,
            settings.upstream_timeout,
            enable_logging,
        )
        .await
}
