//! Structured error types for the relay.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

/// Point in the per-request lifecycle where a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Binding the listening socket at startup
    Bind,
    /// Reading from the listening socket
    Receive,
    /// Locating or decoding the question name
    Decode,
    /// Re-encoding the rewritten name
    Encode,
    /// Opening the upstream association
    Connect,
    /// Writing the query to the upstream
    Send,
    /// Reading the upstream's response
    UpstreamReceive,
    /// Writing the response back to the client
    Reply,
    /// Validating configuration
    Config,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Bind => "bind",
            Stage::Receive => "receive",
            Stage::Decode => "decode",
            Stage::Encode => "encode",
            Stage::Connect => "connect",
            Stage::Send => "send",
            Stage::UpstreamReceive => "upstream_receive",
            Stage::Reply => "reply",
            Stage::Config => "config",
        };
        f.write_str(name)
    }
}

/// Failure to encode a domain name into wire labels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// A label does not fit in the single length byte
    #[error("label of {len} bytes exceeds the 255-byte length prefix")]
    LabelTooLong { len: usize },
}

/// Failure to parse the question name out of a client message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodingError {
    /// A length byte declares more bytes than remain in the span
    #[error("label at offset {offset} declares {declared} bytes but only {available} remain")]
    TruncatedLabel {
        offset: usize,
        declared: usize,
        available: usize,
    },
    /// The message cannot hold a question name at all
    #[error("malformed message: {0}")]
    MalformedMessage(&'static str),
}

/// Main error type for relay operations
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Socket bind, read, or write failure
    #[error("transport error during {stage}: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: io::Error,
    },
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),
    #[error("decoding error: {0}")]
    Decoding(#[from] DecodingError),
    /// Upstream did not answer within the deadline
    #[error("upstream {upstream} did not respond within {timeout:?}")]
    UpstreamTimeout {
        upstream: SocketAddr,
        timeout: Duration,
    },
    #[error("configuration error: {0}")]
    Config(String),
}

impl RelayError {
    pub fn transport(stage: Stage, source: io::Error) -> Self {
        RelayError::Transport { stage, source }
    }

    /// Stage of the request lifecycle this error belongs to
    pub fn stage(&self) -> Stage {
        match self {
            RelayError::Transport { stage, .. } => *stage,
            RelayError::Encoding(_) => Stage::Encode,
            RelayError::Decoding(_) => Stage::Decode,
            RelayError::UpstreamTimeout { .. } => Stage::UpstreamReceive,
            RelayError::Config(_) => Stage::Config,
        }
    }
}

/// Convenience type alias for Results using RelayError
pub type Result<T> = std::result::Result<T, RelayError>;
