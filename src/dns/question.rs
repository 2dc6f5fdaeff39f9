//! Locates the question name inside a raw DNS message.

use crate::dns::wire::HEADER_SIZE;
use crate::error::DecodingError;

/// Byte span of the encoded question name.
///
/// `start..end` is the label data without the terminator; `end` is the
/// offset of the zero terminator itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameSpan {
    pub start: usize,
    pub end: usize,
}

impl NameSpan {
    /// Encoded name bytes, excluding the terminator
    pub fn name_bytes<'a>(&self, message: &'a [u8]) -> &'a [u8] {
        &message[self.start..self.end]
    }

    /// Everything after the terminator (QTYPE, QCLASS and later sections)
    pub fn tail<'a>(&self, message: &'a [u8]) -> &'a [u8] {
        &message[self.end + 1..]
    }
}

/// Find the question name by scanning for the first zero byte after the header.
pub fn question_span(message: &[u8]) -> Result<NameSpan, DecodingError> {
    if message.len() <= HEADER_SIZE {
        return Err(DecodingError::MalformedMessage(
            "message too short for a question section",
        ));
    }

    let end = message[HEADER_SIZE..]
        .iter()
        .position(|&b| b == 0)
        .map(|idx| HEADER_SIZE + idx)
        .ok_or(DecodingError::MalformedMessage(
            "question name has no terminator",
        ))?;

    Ok(NameSpan {
        start: HEADER_SIZE,
        end,
    })
}
