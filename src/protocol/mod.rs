//! # RPC Protocol Layer
//!
//! Push/pull envelopes exchanged between workers and the coordinator.
//!
//! ## Components
//! - **Role**: the `PUSH` / `PULL` tags carried by every call
//! - **Message**: `RpcCall` and `RpcResponse`, plus the `RpcMessage` trait the
//!   framing codec is generic over
//!
//! A call is a plain value `{role, worker, collection}`; the surrounding RPC
//! layer switches on `role` to route it.

pub mod message;
pub mod role;
