use std::time::Duration;
use thiserror::Error;

use crate::dns::enums::ResponseCode;

/// Malformed input: wire bytes, names, or record content fields
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Buffer truncated at offset {offset}: need {need} more bytes")]
    Truncated { offset: usize, need: usize },

    #[error("Compression pointer to offset {pointer} is outside the {len}-byte buffer")]
    PointerOutOfRange { pointer: usize, len: usize },

    #[error("Compression pointer at offset {offset} does not point backwards")]
    PointerLoop { offset: usize },

    #[error("Reserved label type bits 0x{0:02x}")]
    ReservedLabelType(u8),

    #[error("Label too long: {0} bytes")]
    LabelTooLong(usize),

    #[error("DNS name too long")]
    NameTooLong,

    #[error("Invalid DNS label in {0:?}")]
    InvalidLabel(String),

    #[error("Character string too long: {0} bytes")]
    CharacterStringTooLong(usize),

    #[error("Invalid IPv4 address: {0}")]
    InvalidIpv4(String),

    #[error("Invalid IPv6 address: {0}")]
    InvalidIpv6(String),

    #[error("Invalid base64 data: {0}")]
    InvalidBase64(String),

    #[error("Invalid base32hex data: {0}")]
    InvalidBase32(String),

    #[error("Invalid hex data: {0}")]
    InvalidHex(String),

    #[error("Unknown record type: {0}")]
    UnknownType(String),

    #[error("Missing {field} in {rtype} record content")]
    MissingField { rtype: &'static str, field: &'static str },

    #[error("Invalid {field} value {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("Invalid bit stream: {0}")]
    InvalidBitStream(String),

    #[error("Invalid OPT record: {0}")]
    InvalidOpt(String),
}

impl From<std::io::Error> for DecodeError {
    fn from(e: std::io::Error) -> Self {
        DecodeError::InvalidBitStream(e.to_string())
    }
}

/// Record store failures, distinct from legitimately empty results
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store query failed: {0}")]
    Query(String),

    #[error("Store query timed out after {0:?}")]
    Timeout(Duration),

    #[error("No zone id for apex {0}")]
    MissingZoneId(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid backend: {0}")]
    InvalidBackend(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid connection count: {0}")]
    InvalidConnections(String),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Missing database URL for the sqlite backend")]
    MissingDatabaseUrl,

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Unified error type for the resolution core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsError {
    /// Malformed request bytes
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Stored record content that cannot be decoded or encoded
    #[error("Invalid record content: {0}")]
    Content(DecodeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Precondition violated: {0}")]
    Precondition(String),
}

impl DnsError {
    /// Response code to answer a request that failed with this error
    pub fn response_code(&self) -> ResponseCode {
        match self {
            DnsError::Decode(_) => ResponseCode::FormatError,
            DnsError::Content(_) | DnsError::Store(_) | DnsError::Precondition(_) => {
                ResponseCode::ServerFailure
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DnsError>;
