//! # Error Types
//!
//! Error handling for the parameter-server RPC codec.
//!
//! Every codec operation returns [`Result`], and every failure is surfaced to the
//! immediate caller. Nothing is retried or swallowed inside the crate.
//!
//! ## Error Categories
//! - **Validation**: a collection cannot be encoded (non-matrix entry, oversized name)
//! - **Size overflow**: the encoded form would exceed the 32-bit size ceiling
//! - **Malformed input**: a buffer is truncated, negative-length or inconsistent
//! - **Framing**: stream frames larger than the configured limit
//! - **I/O / Configuration**: ambient failures from framing, config files and logging
//!
//! ## Example Usage
//! ```rust
//! use paramserv_rpc::core::list_codec::ListCodec;
//! use paramserv_rpc::error::RpcError;
//!
//! // Header announces one entry but the matrix bytes are missing
//! let mut input: &[u8] = &[0, 0, 0, 1, 0];
//! match ListCodec::decode(&mut input) {
//!     Err(RpcError::MalformedInput(msg)) => println!("rejected: {msg}"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Decode errors
    pub const ERR_TRUNCATED_HEADER: &str = "Truncated list header";
    pub const ERR_TRUNCATED_MATRIX: &str = "Truncated matrix encoding";
    pub const ERR_TRUNCATED_STRING: &str = "Truncated UTF string";
    pub const ERR_NEGATIVE_COUNT: &str = "Negative entry count";
    pub const ERR_TRAILING_BYTES: &str = "Trailing bytes after message";

    /// Encode errors
    pub const ERR_STRING_TOO_LONG: &str = "Encoded string exceeds 65535 bytes";

    /// Concurrency errors
    pub const ERR_LOCK_POISONED: &str = "Synchronization primitive poisoned";
}

/// RpcError is the error type for all codec and envelope operations
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialized size ({0}) larger than i32::MAX")]
    SizeOverflow(u64),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Frame too large: {0} bytes")]
    OversizedFrame(usize),

    #[error("Synchronization primitive poisoned")]
    LockPoisoned,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RpcError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        RpcError::MalformedInput(msg.into())
    }
}

/// Type alias for Results using RpcError
pub type Result<T> = std::result::Result<T, RpcError>;
