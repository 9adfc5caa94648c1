use std::io;

use thiserror::Error;

/// Boxed error produced by user code: capability marshalers and tag transforms.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum CborError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("{0} is not a valid value for additional information")]
    InvalidAdditionalInfo(u8),

    #[error("-1 - {0} exceeds the range of an i64")]
    IntegerOverflow(u64),

    #[error("Declared length of {expected} bytes, but only {available} bytes are left")]
    LengthMismatch { expected: u64, available: usize },

    #[error("Indefinite-length string contains unexpected type {major} with additional value {info}")]
    InvalidChunk { major: u8, info: u8 },

    #[error("Expected a tag, found major type {major}")]
    ExpectedTag { major: u8 },

    #[error("Expected {missing} more element(s) in container of {expected}, but input ends")]
    TruncatedContainer { expected: u64, missing: u64 },

    #[error("Standalone tag {0} with no following data item")]
    StandaloneTag(u64),

    #[error("Simple value {0} is not assigned in RFC 7049")]
    UnassignedSimple(u8),

    #[error("Unexpected break outside an indefinite-length element")]
    UnexpectedBreak,

    #[error("Invalid UTF-8 in text string")]
    InvalidUtf8,

    #[error("Cannot encode type {0}: it has no supported encoding")]
    UnsupportedType(String),

    #[error("Marshal error: {0}")]
    Marshal(BoxError),

    #[error("Transform for tag {tag} failed: {source}")]
    TagTransform { tag: u64, source: BoxError },

    #[error("Serde error: {0}")]
    Serde(String),
}

impl serde::ser::Error for CborError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        CborError::Serde(msg.to_string())
    }
}

impl serde::de::Error for CborError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        CborError::Serde(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CborError>;

/// The error alias most callers reach for.
pub type Error = CborError;
