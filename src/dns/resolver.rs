//! Upstream forwarding with generics for zero-cost abstraction.

use crate::error::{RelayError, Stage};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

/// Sends one query to an upstream resolver and returns its response.
///
/// Implementations must bound the whole exchange by `timeout`.
pub trait Forwarder: Send + Sync {
    fn forward(
        &self,
        query: &[u8],
        upstream: SocketAddr,
        timeout: Duration,
        enable_logging: bool,
    ) -> impl Future<Output = Result<Vec<u8>, RelayError>> + Send;
}

/// UDP forwarder that opens a fresh association per query
pub struct UdpForwarder {
    response_buffer_size: usize,
}

impl UdpForwarder {
    pub fn new(response_buffer_size: usize) -> Self {
        Self {
            response_buffer_size,
        }
    }

    async fn exchange(&self, query: &[u8], upstream: SocketAddr) -> Result<Vec<u8>, RelayError> {
        // Bind to appropriate address family based on upstream (IPv4 or IPv6)
        let bind_addr = if upstream.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| RelayError::transport(Stage::Connect, e))?;
        // A connected socket drops datagrams from any other source
        socket
            .connect(upstream)
            .await
            .map_err(|e| RelayError::transport(Stage::Connect, e))?;

        socket
            .send(query)
            .await
            .map_err(|e| RelayError::transport(Stage::Send, e))?;

        let mut response_buf = vec![0u8; self.response_buffer_size];
        let len = socket
            .recv(&mut response_buf)
            .await
            .map_err(|e| RelayError::transport(Stage::UpstreamReceive, e))?;
        response_buf.truncate(len);
        Ok(response_buf)
    }
}

impl Forwarder for UdpForwarder {
    async fn forward(
        &self,
        query: &[u8],
        upstream: SocketAddr,
        timeout: Duration,
        enable_logging: bool,
    ) -> Result<Vec<u8>, RelayError> {
        match tokio::time::timeout(timeout, self.exchange(query, upstream)).await {
            Ok(Ok(response)) => {
                if enable_logging {
                    debug!(upstream = %upstream, bytes = response.len(), "upstream responded");
                }
                Ok(response)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(RelayError::UpstreamTimeout { upstream, timeout }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn spawn_echo_upstream() -> SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            while let Ok((len, src)) = socket.recv_from(&mut buf).await {
                let _ = socket.send_to(&buf[..len], src).await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_forward_returns_upstream_bytes() {
        let upstream = spawn_echo_upstream().await;
        let forwarder = UdpForwarder::new(512);

        let response = forwarder
            .forward(&[1, 2, 3, 4, 5], upstream, Duration::from_secs(2), false)
            .await
            .unwrap();
        assert_eq!(response, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_forward_truncates_to_buffer_size() {
        let upstream = spawn_echo_upstream().await;
        let forwarder = UdpForwarder::new(4);

        let response = forwarder
            .forward(&[9u8; 10], upstream, Duration::from_secs(2), true)
            .await
            .unwrap();
        assert_eq!(response, vec![9, 9, 9, 9]);
    }

    #[tokio::test]
    async fn test_forward_times_out_on_silent_upstream() {
        // Bound but never read, so no reply ever comes back
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let upstream = silent.local_addr().unwrap();
        let forwarder = UdpForwarder::new(512);

        let result = forwarder
            .forward(&[0, 1], upstream, Duration::from_millis(100), false)
            .await;

        match result {
            Err(RelayError::UpstreamTimeout { upstream: addr, timeout }) => {
                assert_eq!(addr, upstream);
                assert_eq!(timeout, Duration::from_millis(100));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
