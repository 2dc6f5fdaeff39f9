//! DNS label codec (RFC 1035 section 3.1).
//!
//! Converts between the length-prefixed label sequence used on the wire and
//! a dotted domain name. Labels are carried as raw bytes; nothing here checks
//! for legal hostname characters or the 63-byte label limit.

use crate::error::{DecodingError, EncodingError};
use std::fmt;

/// Size of the fixed DNS message header
pub const HEADER_SIZE: usize = 12;

/// Classic DNS-over-UDP datagram limit without EDNS0
pub const MAX_DATAGRAM_SIZE: usize = 512;

const LABEL_SEPARATOR: u8 = b'.';
const TERMINATOR: u8 = 0x00;

/// A dotted domain name, stored as raw bytes.
///
/// Decoded labels are not required to be UTF-8, so the name keeps the exact
/// bytes seen on the wire. `Display` renders it lossily for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DomainName(Vec<u8>);

impl DomainName {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        DomainName(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the labels, split on `.`
    pub fn labels(&self) -> impl Iterator<Item = &[u8]> {
        // An empty name has no labels, not one empty label
        let labels = if self.0.is_empty() {
            None
        } else {
            Some(self.0.split(|&b| b == LABEL_SEPARATOR))
        };
        labels.into_iter().flatten()
    }

    /// Remove `suffix` from the end of the name if present.
    pub fn strip_suffix(&self, suffix: &str) -> DomainName {
        if suffix.is_empty() {
            return self.clone();
        }
        match self.0.strip_suffix(suffix.as_bytes()) {
            Some(rest) => DomainName(rest.to_vec()),
            None => self.clone(),
        }
    }
}

impl From<&str> for DomainName {
    fn from(name: &str) -> Self {
        DomainName(name.as_bytes().to_vec())
    }
}

impl From<String> for DomainName {
    fn from(name: String) -> Self {
        DomainName(name.into_bytes())
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Encode a dotted name as wire labels followed by a single zero terminator.
pub fn encode_name(name: &DomainName) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::with_capacity(name.as_bytes().len() + 2);
    for label in name.labels() {
        let len = u8::try_from(label.len())
            .map_err(|_| EncodingError::LabelTooLong { len: label.len() })?;
        buf.push(len);
        buf.extend_from_slice(label);
    }
    buf.push(TERMINATOR);
    Ok(buf)
}

/// Decode a label sequence into a dotted name.
///
/// Stops at the first zero-length label or at the end of `buf`, whichever
/// comes first, so callers may pass the span with or without its terminator.
pub fn decode_name(buf: &[u8]) -> Result<DomainName, DecodingError> {
    let mut name = Vec::with_capacity(buf.len());
    let mut pos = 0;

    while pos < buf.len() {
        let len = buf[pos] as usize;
        if len == 0 {
            break;
        }

        let available = buf.len() - pos - 1;
        if len > available {
            return Err(DecodingError::TruncatedLabel {
                offset: pos,
                declared: len,
                available,
            });
        }

        if pos > 0 {
            name.push(LABEL_SEPARATOR);
        }
        name.extend_from_slice(&buf[pos + 1..pos + 1 + len]);
        pos += 1 + len;
    }

    Ok(DomainName(name))
}

// ==================== Helper for building DNS packets (tests) ====================
