//! # RPC Messages
//!
//! One call type and one response type serve both roles; the role is a tag
//! inside the call rather than a separate message type.
//!
//! ## Wire Format
//! ```text
//! RpcCall:     [Role(i32)] [WorkerId(i32)] [Collection]?   collection only if non-empty
//! RpcResponse: [Status(i32)] [Payload]
//!              SUCCESS(0): collection, SUCCESS_EMPTY(1): nothing, ERROR(2): UTF message
//! ```

use crate::core::data::NamedCollection;
use crate::core::list_codec::{ListCodec, MAX_ENCODED_SIZE};
use crate::core::utf;
use crate::error::{constants, Result, RpcError};
use crate::protocol::role::Role;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;
use tracing::debug;

/// Role tag plus worker id
pub const CALL_HEADER_SIZE: usize = 4 + 4;

/// Status tag
pub const RESPONSE_HEADER_SIZE: usize = 4;

pub const STATUS_SUCCESS: i32 = 0;
pub const STATUS_SUCCESS_EMPTY: i32 = 1;
pub const STATUS_ERROR: i32 = 2;

/// Types that travel as one self-contained RPC buffer
pub trait RpcMessage: Sized {
    /// Exact number of bytes `encode` writes
    fn encoded_size(&self) -> Result<usize>;

    /// Write the message; nothing is written if validation fails
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()>;

    /// Read one message from the front of `buf`
    fn decode<B: Buf>(buf: &mut B) -> Result<Self>;

    /// Encode into a buffer allocated to the exact size
    fn to_bytes(&self) -> Result<Bytes> {
        let size = self.encoded_size()?;
        let mut buf = BytesMut::with_capacity(size);
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode a buffer holding exactly one message
    fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut input = data;
        let msg = Self::decode(&mut input)?;
        if input.has_remaining() {
            return Err(RpcError::malformed(format!(
                "{}: {} bytes",
                constants::ERR_TRAILING_BYTES,
                input.remaining()
            )));
        }
        Ok(msg)
    }
}

fn checked_total(header: usize, body: usize) -> Result<usize> {
    let total = header as u64 + body as u64;
    if total > MAX_ENCODED_SIZE {
        return Err(RpcError::SizeOverflow(total));
    }
    Ok(total as usize)
}

impl RpcMessage for NamedCollection {
    fn encoded_size(&self) -> Result<usize> {
        ListCodec::compute_encoded_size(Some(self))
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        ListCodec::encode(self, buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        ListCodec::decode(buf)
    }
}

/// A push or pull request from a worker
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
    pub role: Role,
    pub worker_id: i32,
    /// Always `None` rather than an empty collection
    pub data: Option<NamedCollection>,
}

impl RpcCall {
    pub fn new(role: Role, worker_id: i32, data: Option<NamedCollection>) -> Self {
        Self {
            role,
            worker_id,
            data: data.filter(|d| !d.is_empty()),
        }
    }

    /// Worker sends its update
    pub fn push(worker_id: i32, data: NamedCollection) -> Self {
        Self::new(Role::Push, worker_id, Some(data))
    }

    /// Worker asks for the current model
    pub fn pull(worker_id: i32) -> Self {
        Self::new(Role::Pull, worker_id, None)
    }
}

impl RpcMessage for RpcCall {
    fn encoded_size(&self) -> Result<usize> {
        checked_total(
            CALL_HEADER_SIZE,
            ListCodec::compute_encoded_size(self.data.as_ref())?,
        )
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        if let Some(data) = &self.data {
            ListCodec::check(data)?;
        }
        buf.put_i32(self.role.tag());
        buf.put_i32(self.worker_id);
        if let Some(data) = &self.data {
            ListCodec::encode(data, buf)?;
        }
        Ok(())
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        if buf.remaining() < CALL_HEADER_SIZE {
            return Err(RpcError::malformed("Truncated call header"));
        }
        let tag = buf.get_i32();
        let role = Role::from_tag(tag)
            .ok_or_else(|| RpcError::malformed(format!("Unknown role tag {tag}")))?;
        let worker_id = buf.get_i32();

        let data = if buf.has_remaining() {
            Some(ListCodec::decode(buf)?)
        } else {
            None
        };

        debug!(%role, worker_id, entries = data.as_ref().map_or(0, NamedCollection::len), "Decoded call");
        Ok(Self::new(role, worker_id, data))
    }
}

/// Coordinator reply to a call
#[derive(Debug, Clone, PartialEq)]
pub enum RpcResponse {
    /// Request served, carrying a collection (the model for a pull)
    Success(NamedCollection),
    /// Request served, nothing to return
    SuccessEmpty,
    /// Request failed on the coordinator
    Error(String),
}

impl RpcResponse {
    pub fn error(err: impl fmt::Display) -> Self {
        RpcResponse::Error(err.to_string())
    }

    /// Wire status tag
    pub fn status(&self) -> i32 {
        match self {
            RpcResponse::Success(_) => STATUS_SUCCESS,
            RpcResponse::SuccessEmpty => STATUS_SUCCESS_EMPTY,
            RpcResponse::Error(_) => STATUS_ERROR,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, RpcResponse::Error(_))
    }

    /// Collection carried by a successful response
    pub fn into_data(self) -> Option<NamedCollection> {
        match self {
            RpcResponse::Success(data) => Some(data),
            _ => None,
        }
    }
}

impl RpcMessage for RpcResponse {
    fn encoded_size(&self) -> Result<usize> {
        let body = match self {
            RpcResponse::Success(data) => ListCodec::compute_encoded_size(Some(data))?,
            RpcResponse::SuccessEmpty => 0,
            RpcResponse::Error(msg) => utf::utf_size(msg) as usize,
        };
        checked_total(RESPONSE_HEADER_SIZE, body)
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        match self {
            RpcResponse::Success(data) => ListCodec::check(data)?,
            RpcResponse::SuccessEmpty => {}
            RpcResponse::Error(msg) => utf::check_utf(msg)?,
        }

        buf.put_i32(self.status());
        match self {
            RpcResponse::Success(data) => ListCodec::encode(data, buf),
            RpcResponse::SuccessEmpty => Ok(()),
            RpcResponse::Error(msg) => utf::put_utf(buf, msg),
        }
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        if buf.remaining() < RESPONSE_HEADER_SIZE {
            return Err(RpcError::malformed("Truncated response header"));
        }
        match buf.get_i32() {
            STATUS_SUCCESS => Ok(RpcResponse::Success(ListCodec::decode(buf)?)),
            STATUS_SUCCESS_EMPTY => Ok(RpcResponse::SuccessEmpty),
            STATUS_ERROR => Ok(RpcResponse::Error(utf::get_utf(buf)?)),
            other => Err(RpcError::malformed(format!(
                "Unknown response status {other}"
            ))),
        }
    }
}
