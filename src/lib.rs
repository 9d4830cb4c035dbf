//! # paramserv-rpc
//!
//! Binary codec for the push/pull exchange between parameter-server workers
//! and their coordinator.
//!
//! The crate encodes ordered, optionally named collections of matrices into
//! contiguous buffers, decodes them back, and computes the exact encoded size
//! before allocation. Push and pull calls, coordinator responses and a Tokio
//! framing codec are layered on top of the same collection format.
//!
//! ## Modules
//! - [`core`]: matrix blocks, handles, collections, list codec, framing
//! - [`protocol`]: role tags and call/response envelopes
//! - [`config`]: TOML / environment configuration
//! - [`error`]: error taxonomy
//! - [`utils`]: logging and metrics
//!
//! ## Example
//! ```rust
//! use paramserv_rpc::core::data::NamedCollection;
//! use paramserv_rpc::core::list_codec::ListCodec;
//! use paramserv_rpc::core::matrix::MatrixBlock;
//!
//! let grads = NamedCollection::named(vec![
//!     ("W", MatrixBlock::from_rows(vec![vec![0.5, -1.0], vec![0.0, 2.0]]).unwrap()),
//! ]);
//!
//! let size = ListCodec::compute_encoded_size(Some(&grads)).unwrap();
//! let mut buf = Vec::with_capacity(size);
//! ListCodec::encode(&grads, &mut buf).unwrap();
//! assert_eq!(buf.len(), size);
//!
//! let back = ListCodec::decode(&mut &buf[..]).unwrap();
//! assert_eq!(back, grads);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod utils;

pub use crate::core::codec::RpcCodec;
pub use crate::core::data::{Data, NamedCollection};
pub use crate::core::handle::{MatrixObject, ReadPin};
pub use crate::core::list_codec::ListCodec;
pub use crate::core::matrix::MatrixBlock;
pub use crate::error::{Result, RpcError};
pub use crate::protocol::message::{RpcCall, RpcMessage, RpcResponse};
pub use crate::protocol::role::{Role, PULL, PUSH};
