//! # List Codec
//!
//! Encodes an ordered, optionally named collection of matrices into one
//! contiguous buffer, decodes it back, and computes the exact encoded size
//! ahead of allocation.
//!
//! ## Wire Format
//! ```text
//! [EntryCount(i32)] [IsNamed(u8)]
//! repeat EntryCount:
//!     [Name(u16 len + modified UTF-8)]   only when IsNamed
//!     [Matrix(self-describing)]
//! ```
//!
//! An empty collection has size 0 and occupies no bytes at all; decoding an
//! exhausted input yields an empty unnamed collection.
//!
//! Every matrix is read through its own [`ReadPin`](crate::core::handle::ReadPin),
//! taken just before measuring or writing that entry and dropped right after.

use crate::core::data::{Data, NamedCollection};
use crate::core::handle::MatrixObject;
use crate::core::matrix::{MatrixBlock, MATRIX_HEADER_SIZE};
use crate::core::utf;
use crate::error::{constants, Result, RpcError};
use crate::utils::metrics::{global_metrics, Timer};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, warn};

/// Entry count plus named flag
pub const LIST_HEADER_SIZE: u64 = 4 + 1;

/// Size ceiling for any encoded buffer
pub const MAX_ENCODED_SIZE: u64 = i32::MAX as u64;

/// Stateless codec for [`NamedCollection`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCodec;

impl ListCodec {
    /// Exact number of bytes `encode` writes for `collection`.
    ///
    /// Accepts exactly the collections `encode` accepts.
    ///
    /// # Errors
    /// - `Validation` if an entry is not a matrix or a name is too long
    /// - `LockPoisoned` if an entry's lock is poisoned
    /// - `SizeOverflow` if the total exceeds `i32::MAX`
    pub fn compute_encoded_size(collection: Option<&NamedCollection>) -> Result<usize> {
        let list = match collection {
            Some(list) if !list.is_empty() => list,
            _ => return Ok(0),
        };

        let matrices = Self::validate(list)?;

        let mut total = LIST_HEADER_SIZE;
        if let Some(names) = list.names() {
            total += names.iter().map(|n| utf::utf_size(n)).sum::<u64>();
        }
        for obj in matrices {
            let pin = obj.acquire_read()?;
            total = total.saturating_add(pin.exact_size_on_disk());
        }

        if total > MAX_ENCODED_SIZE {
            global_metrics().size_overflow();
            warn!(size = total, entries = list.len(), "Encoded size exceeds i32::MAX");
            return Err(RpcError::SizeOverflow(total));
        }
        Ok(total as usize)
    }

    /// Encode `collection` into `output`.
    ///
    /// All entries are validated before the first byte is written, so a
    /// failed call leaves the sink untouched.
    pub fn encode<B: BufMut>(collection: &NamedCollection, output: &mut B) -> Result<()> {
        let matrices = Self::validate(collection)?;
        if matrices.is_empty() {
            return Ok(());
        }

        let _timer = Timer::start("list_encode");

        let mut written = LIST_HEADER_SIZE;
        output.put_i32(matrices.len() as i32);
        output.put_u8(collection.is_named() as u8);

        for (i, obj) in matrices.into_iter().enumerate() {
            if let Some(name) = collection.name(i) {
                utf::put_utf(output, name)?;
                written += utf::utf_size(name);
            }
            let pin = obj.acquire_read()?;
            pin.write_to(output);
            written += pin.exact_size_on_disk();
        }

        global_metrics().collection_encoded(written);
        debug!(
            entries = collection.len(),
            named = collection.is_named(),
            bytes = written,
            "Encoded collection"
        );
        Ok(())
    }

    /// Decode one collection from `input`.
    ///
    /// All-or-nothing: any truncation or inconsistency fails the whole call.
    pub fn decode<B: Buf>(input: &mut B) -> Result<NamedCollection> {
        let _timer = Timer::start("list_decode");
        Self::decode_inner(input).map_err(|e| {
            global_metrics().malformed_input();
            warn!(error = %e, "Failed to decode collection");
            e
        })
    }

    /// Size, allocate exactly, and encode
    pub fn to_bytes(collection: &NamedCollection) -> Result<Bytes> {
        let size = Self::compute_encoded_size(Some(collection))?;
        let mut buf = BytesMut::with_capacity(size);
        Self::encode(collection, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Run the pre-write checks `encode` performs, without writing
    pub fn check(collection: &NamedCollection) -> Result<()> {
        Self::validate(collection).map(|_| ())
    }

    fn validate(collection: &NamedCollection) -> Result<Vec<&MatrixObject>> {
        check_encodable(collection).map_err(|e| {
            global_metrics().validation_failure();
            warn!(error = %e, "Rejected collection before encoding");
            e
        })
    }

    fn decode_inner<B: Buf>(input: &mut B) -> Result<NamedCollection> {
        let start = input.remaining();
        if start == 0 {
            return Ok(NamedCollection::default());
        }
        if start < LIST_HEADER_SIZE as usize {
            return Err(RpcError::malformed(constants::ERR_TRUNCATED_HEADER));
        }

        let count = input.get_i32();
        if count < 0 {
            return Err(RpcError::malformed(format!(
                "{}: {count}",
                constants::ERR_NEGATIVE_COUNT
            )));
        }
        let named = match input.get_u8() {
            0 => false,
            1 => true,
            other => {
                return Err(RpcError::malformed(format!(
                    "Invalid named flag {other}"
                )))
            }
        };

        let count = count as usize;
        let cap = count.min(input.remaining() / MATRIX_HEADER_SIZE as usize);
        let mut data = Vec::with_capacity(cap);
        let mut names = named.then(|| Vec::with_capacity(cap));

        for _ in 0..count {
            if let Some(names) = names.as_mut() {
                names.push(utf::get_utf(input)?);
            }
            let block = MatrixBlock::read_from(input)?;
            data.push(Data::Matrix(MatrixObject::new(block)));
        }

        let consumed = (start - input.remaining()) as u64;
        global_metrics().collection_decoded(consumed);
        debug!(entries = count, named, bytes = consumed, "Decoded collection");

        NamedCollection::new(data, names)
    }
}

fn check_encodable(collection: &NamedCollection) -> Result<Vec<&MatrixObject>> {
    if i32::try_from(collection.len()).is_err() {
        return Err(RpcError::Validation(format!(
            "Entry count {} exceeds i32::MAX",
            collection.len()
        )));
    }
    if let Some(names) = collection.names() {
        names.iter().try_for_each(|n| utf::check_utf(n))?;
    }
    let matrices = collection
        .data()
        .iter()
        .map(expect_matrix)
        .collect::<Result<Vec<_>>>()?;
    if matrices.iter().any(|m| m.is_poisoned()) {
        return Err(RpcError::LockPoisoned);
    }
    Ok(matrices)
}

fn expect_matrix(entry: &Data) -> Result<&MatrixObject> {
    entry.as_matrix().ok_or_else(|| {
        RpcError::Validation(format!(
            "Unsupported deep serialize of {}, which is not matrix.",
            entry.debug_name()
        ))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> NamedCollection {
        NamedCollection::named(vec![
            ("a", MatrixBlock::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap()),
            ("b", MatrixBlock::from_rows(vec![vec![5.0], vec![6.0], vec![7.0]]).unwrap()),
        ])
    }

    #[test]
    fn test_absent_and_empty_size_zero() {
        assert_eq!(ListCodec::compute_encoded_size(None).unwrap(), 0);
        let empty = NamedCollection::default();
        assert_eq!(ListCodec::compute_encoded_size(Some(&empty)).unwrap(), 0);

        let mut buf = Vec::new();
        ListCodec::encode(&empty, &mut buf).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_header_layout() {
        let bytes = ListCodec::to_bytes(&sample()).unwrap();
        assert_eq!(&bytes[..4], &2i32.to_be_bytes());
        assert_eq!(bytes[4], 1);
        assert_eq!(&bytes[5..8], &[0x00, 0x01, b'a']);
    }

    #[test]
    fn test_pins_released_after_each_call() {
        let list = sample();
        ListCodec::compute_encoded_size(Some(&list)).unwrap();
        ListCodec::to_bytes(&list).unwrap();
        for entry in list.data() {
            assert_eq!(entry.as_matrix().unwrap().pin_count(), 0);
        }
    }

    #[test]
    fn test_validation_names_offender() {
        let list = NamedCollection::unnamed(vec![
            Data::from(MatrixBlock::zeros(1, 1).unwrap()),
            Data::Scalar(0.5),
        ]);
        let mut buf = Vec::new();
        match ListCodec::encode(&list, &mut buf) {
            Err(RpcError::Validation(msg)) => assert!(msg.contains("SCALAR(0.5)")),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn test_sizing_rejects_overlong_name() {
        let name = "n".repeat(utf::MAX_UTF_BYTES + 1);
        let list = NamedCollection::named(vec![(name, MatrixBlock::zeros(1, 1).unwrap())]);
        assert!(matches!(
            ListCodec::compute_encoded_size(Some(&list)),
            Err(RpcError::Validation(_))
        ));
        assert!(matches!(
            ListCodec::encode(&list, &mut Vec::<u8>::new()),
            Err(RpcError::Validation(_))
        ));
    }

    #[test]
    fn test_invalid_named_flag() {
        let mut bytes = ListCodec::to_bytes(&sample()).unwrap().to_vec();
        bytes[4] = 7;
        let mut input = &bytes[..];
        assert!(matches!(
            ListCodec::decode(&mut input),
            Err(RpcError::MalformedInput(_))
        ));
    }
}
