use std::str::Utf8Error;
use thiserror::Error;

/// Reasons for discarding a datagram as a whole
#[derive(Debug, Error)]
pub enum DatagramError {
    #[error("datagram is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),

    #[error("datagram is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("datagram's top level JSON value is not an object")]
    NotAnObject,
}

/// Reasons for discarding a single subject's update. Decoding stops at the first defect, so this
///  is always the first problem encountered, not necessarily the only one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubjectDecodeError {
    #[error("subject value is not a JSON object")]
    NotAnObject,

    #[error("{section} #{index} is not a JSON object")]
    EntryNotAnObject { section: &'static str, index: usize },

    #[error("{section} #{index}: field '{field}' is missing or has the wrong type")]
    InvalidField { section: &'static str, index: usize, field: &'static str },

    #[error("{section} #{index}: field '{field}' must be an array of exactly {expected} numbers")]
    InvalidVector { section: &'static str, index: usize, field: &'static str, expected: usize },
}
