//! ndisc - ICMPv6 Neighbor Discovery codec
//!
//! Decodes and encodes Router/Neighbor Solicitation and Advertisement
//! messages together with their options (RFC 4861, RFC 3971, RFC 6106).
//! Everything in [`protocol`] is a pure function over byte buffers; socket
//! I/O belongs to the caller.

pub mod config;
pub mod error;
pub mod protocol;
pub mod telemetry;

pub use error::{Error, Result};
