//! DNS relay: question name rewriting and upstream forwarding.

pub mod question;
pub mod resolver;
pub mod rewrite;
mod server;
pub mod wire;

pub use resolver::{Forwarder, UdpForwarder};
pub use rewrite::{rewrite_query, RewrittenQuery};
pub use server::{handle_query, relay_query, run_relay_server, serve};
pub use wire::{decode_name, encode_name, DomainName};
