//! # Frame Codec
//!
//! Length-delimited framing for RPC messages over byte streams.
//!
//! ```text
//! [Length(u32)] [Message(Length)]
//! ```
//!
//! The frame length is checked against `max_frame_size` before any buffer is
//! reserved for the body.

use crate::config::{CodecConfig, DEFAULT_MAX_FRAME_SIZE};
use crate::error::{Result, RpcError};
use crate::protocol::message::RpcMessage;
use bytes::{Buf, BufMut, BytesMut};
use std::marker::PhantomData;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

/// Frame length prefix
pub const FRAME_HEADER_SIZE: usize = 4;

/// Tokio codec carrying one `T` per frame
#[derive(Debug)]
pub struct RpcCodec<T> {
    max_frame_size: usize,
    _message: PhantomData<fn() -> T>,
}

impl<T> RpcCodec<T> {
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            _message: PhantomData,
        }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self::with_max_frame_size(config.max_frame_size)
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl<T> Default for RpcCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RpcCodec<T> {
    fn clone(&self) -> Self {
        Self::with_max_frame_size(self.max_frame_size)
    }
}

impl<T: RpcMessage> Encoder<T> for RpcCodec<T> {
    type Error = RpcError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<()> {
        let size = item.encoded_size()?;
        if size > self.max_frame_size {
            return Err(RpcError::OversizedFrame(size));
        }

        dst.reserve(FRAME_HEADER_SIZE + size);
        let start = dst.len();
        dst.put_u32(0);
        if let Err(e) = item.encode(dst) {
            dst.truncate(start);
            return Err(e);
        }

        // matrices may have changed since sizing; the prefix records what was written
        let len = dst.len() - start - FRAME_HEADER_SIZE;
        if len > self.max_frame_size {
            dst.truncate(start);
            return Err(RpcError::OversizedFrame(len));
        }
        dst[start..start + FRAME_HEADER_SIZE].copy_from_slice(&(len as u32).to_be_bytes());
        Ok(())
    }
}

impl<T: RpcMessage> Decoder for RpcCodec<T> {
    type Item = T;
    type Error = RpcError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<T>> {
        if src.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let mut header = [0u8; FRAME_HEADER_SIZE];
        header.copy_from_slice(&src[..FRAME_HEADER_SIZE]);
        let len = u32::from_be_bytes(header) as usize;

        if len > self.max_frame_size {
            warn!(len, max = self.max_frame_size, "Rejecting oversized frame");
            return Err(RpcError::OversizedFrame(len));
        }
        if src.len() < FRAME_HEADER_SIZE + len {
            src.reserve(FRAME_HEADER_SIZE + len - src.len());
            return Ok(None);
        }

        src.advance(FRAME_HEADER_SIZE);
        let frame = src.split_to(len).freeze();
        T::from_bytes(&frame).map(Some)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::core::data::NamedCollection;
    use crate::core::matrix::MatrixBlock;

    #[test]
    fn test_partial_frame_not_consumed() {
        let mut codec = RpcCodec::<NamedCollection>::new();
        let mut buf = BytesMut::from(&[0x00, 0x00, 0x00, 0x10, 0x01][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn test_encode_decode_frame() {
        let mut codec = RpcCodec::<NamedCollection>::new();
        let list = NamedCollection::named(vec![("w", MatrixBlock::zeros(2, 2).unwrap())]);

        let mut buf = BytesMut::new();
        codec.encode(list.clone(), &mut buf).unwrap();
        let size = crate::core::list_codec::ListCodec::compute_encoded_size(Some(&list)).unwrap();
        assert_eq!(buf.len(), FRAME_HEADER_SIZE + size);

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, list);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut codec = RpcCodec::<NamedCollection>::with_max_frame_size(8);
        let mut buf = BytesMut::new();
        buf.put_u32(9);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(RpcError::OversizedFrame(9))
        ));

        let big = NamedCollection::unnamed(vec![MatrixBlock::zeros(1, 1).unwrap().into()]);
        assert!(matches!(
            codec.encode(big, &mut BytesMut::new()),
            Err(RpcError::OversizedFrame(_))
        ));
    }
}
