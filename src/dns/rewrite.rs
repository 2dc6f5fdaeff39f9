//! Question name rewriting.
//!
//! Builds the upstream-bound message by replacing the question name and
//! copying the header and everything after the name through unchanged. No
//! header field needs adjusting: the question count is the same and UDP
//! carries the message length in the datagram boundary.

use crate::dns::question::{question_span, NameSpan};
use crate::dns::wire::{decode_name, encode_name, DomainName, HEADER_SIZE};
use crate::error::{EncodingError, Result};

/// A query with its question name rewritten for the upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenQuery {
    /// Name as sent by the client
    pub original: DomainName,
    /// Name forwarded upstream
    pub forwarded: DomainName,
    /// Complete message to send upstream
    pub message: Vec<u8>,
}

/// Replace the question name at `span` with `replacement`.
pub fn splice_name(
    message: &[u8],
    span: NameSpan,
    replacement: &DomainName,
) -> std::result::Result<Vec<u8>, EncodingError> {
    let encoded = encode_name(replacement)?;
    let tail = span.tail(message);

    let mut out = Vec::with_capacity(HEADER_SIZE + encoded.len() + tail.len());
    out.extend_from_slice(&message[..HEADER_SIZE]);
    out.extend_from_slice(&encoded);
    out.extend_from_slice(tail);
    Ok(out)
}

/// Decode the question name, strip `suffix` from it and re-encode the message.
pub fn rewrite_query(message: &[u8], suffix: &str) -> Result<RewrittenQuery> {
    let span = question_span(message)?;
    let original = decode_name(span.name_bytes(message))?;
    let forwarded = original.strip_suffix(suffix);
    let message = splice_name(message, span, &forwarded)?;

    Ok(RewrittenQuery {
        original,
        forwarded,
        message,
    })
}
