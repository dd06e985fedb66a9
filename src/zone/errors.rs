use thiserror::Error;

/// Master-file loading errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZoneFileError {
    #[error("Zone parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unclosed parentheses starting at line {0}")]
    UnclosedParentheses(usize),

    #[error("Invalid TTL value: {0}")]
    InvalidTtl(String),

    #[error("Zone file missing $ORIGIN directive or SOA record")]
    MissingOrigin,

    #[error("Zone file exceeds maximum size")]
    FileTooLarge,

    #[error("IO error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, ZoneFileError>;
