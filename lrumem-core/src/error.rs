//! Error types for lrumem.
//!
//! Expected absence (a missing key on `get`, `delete` or `replace`, an
//! existing key on `add`) is never an error and is reported through `bool`
//! or `Option` results. The types here cover the two genuinely fallible
//! surfaces: decoding a dumped byte stream and reading configuration.

use std::io;
use std::str::Utf8Error;
use thiserror::Error;

// == Codec Error Enum ==
/// A fault raised while decoding a dumped cache stream.
///
/// Every variant is fatal for the stream being decoded: the decoder stops at
/// the first fault and never guesses past it.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Fewer than the 8 bytes of a length prefix remained in the input.
    #[error("truncated length prefix: expected 8 bytes, found {available}")]
    TruncatedHeader { available: usize },

    /// A chunk declared more payload bytes than the input holds.
    #[error("truncated chunk: declared {declared} bytes, only {available} available")]
    TruncatedChunk { declared: u64, available: usize },

    /// The input ended after a key chunk without the matching value chunk.
    #[error("stream ended after a key chunk without its value chunk")]
    MissingValue,

    /// A fixed-width payload had the wrong byte length.
    #[error("invalid payload length for {type_name}: expected {expected} bytes, found {actual}")]
    InvalidLength {
        type_name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A sequence payload was not a whole number of elements.
    #[error("misaligned payload for {type_name}: {actual} bytes is not a multiple of {width}")]
    Misaligned {
        type_name: &'static str,
        width: usize,
        actual: usize,
    },

    /// The payload had the right shape but an invalid value.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// A text payload was not valid UTF-8.
    #[error("invalid UTF-8 payload: {0}")]
    Utf8(#[from] Utf8Error),

    /// The underlying reader failed.
    #[error("I/O error while decoding: {0}")]
    Io(#[from] io::Error),
}

// == Config Error Enum ==
/// A malformed configuration value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A memory size could not be parsed (`512`, `64KB`, `16MB`, `1GB`).
    #[error("invalid memory size {value:?} for {name}")]
    InvalidSize { name: String, value: String },

    /// An item count could not be parsed.
    #[error("invalid item count {value:?} for {name}")]
    InvalidCount { name: String, value: String },
}

// == Result Type Alias ==
/// Convenience Result type for decode operations.
pub type Result<T> = std::result::Result<T, CodecError>;
