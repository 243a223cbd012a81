use crate::protocol::OptionType;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("message too short: {actual} bytes, need at least {expected}")]
    MessageTooShort { expected: usize, actual: usize },

    #[error("message with type {0} not supported")]
    UnsupportedMessageType(u8),

    #[error("{kind} option ({}): declared {declared} bytes but only {available} remain", .kind.as_u8())]
    OptionBufferUnderrun {
        kind: OptionType,
        declared: usize,
        available: usize,
    },

    #[error("length mismatch while parsing {kind} option ({}): {computed} should be {declared}", .kind.as_u8())]
    OptionLengthMismatch {
        kind: OptionType,
        computed: usize,
        declared: usize,
    },

    #[error("{kind} option ({}) has zero length", .kind.as_u8())]
    OptionZeroLength { kind: OptionType },

    #[error("{kind} option ({}) too long: {words} units of 8 octets", .kind.as_u8())]
    OptionTooLong { kind: OptionType, words: usize },

    #[error("{kind} option ({}): {len} byte body does not fill whole 8-octet units", .kind.as_u8())]
    UnalignedOptionBody { kind: OptionType, len: usize },

    #[error("{kind} option ({}) has no entries", .kind.as_u8())]
    EmptyOption { kind: OptionType },

    #[error("invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("nonce {0} too large to fit in 48 bits")]
    NonceOutOfRange(u64),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid hex input: {0}")]
    Hex(String),
}

pub type Result<T> = std::result::Result<T, Error>;
