//! dns-relay - A transparent DNS relay that strips a synthetic suffix.
//!
//! Queries whose question name ends in the configured suffix (`.proxy` by
//! default) are forwarded upstream with the suffix removed; the upstream's
//! answer is relayed back to the client unchanged. This crate exposes the
//! relay as a library for testing and integration purposes.

pub mod config;
pub mod dns;
pub mod error;
pub mod logging;
