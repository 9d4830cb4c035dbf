//! Property-based tests using proptest
//!
//! These tests check the codec invariants (exact sizing, lossless round trip,
//! determinism, decoder totality) over randomly generated collections.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use paramserv_rpc::core::data::{Data, NamedCollection};
use paramserv_rpc::core::list_codec::ListCodec;
use paramserv_rpc::core::matrix::{BlockType, MatrixBlock};
use paramserv_rpc::protocol::message::{RpcCall, RpcMessage};
use proptest::prelude::*;

fn cell_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        3 => Just(0.0),
        5 => -1.0e6..1.0e6f64,
        1 => Just(f64::MIN_POSITIVE),
    ]
}

fn dense_block() -> impl Strategy<Value = MatrixBlock> {
    (0usize..12, 0usize..12).prop_flat_map(|(r, c)| {
        prop::collection::vec(cell_value(), r * c)
            .prop_map(move |values| MatrixBlock::from_dense(r, c, values).expect("valid shape"))
    })
}

fn sparse_block() -> impl Strategy<Value = MatrixBlock> {
    (1usize..200, 1usize..200).prop_flat_map(|(r, c)| {
        prop::collection::vec((0..r, 0..c, -10.0..10.0f64), 0..40).prop_map(move |cells| {
            MatrixBlock::from_triplets(r, c, cells).expect("cells in range")
        })
    })
}

fn block() -> impl Strategy<Value = MatrixBlock> {
    prop_oneof![dense_block(), sparse_block()]
}

fn collection() -> impl Strategy<Value = NamedCollection> {
    (
        prop::collection::vec(block(), 1..6),
        prop::option::of(prop::collection::vec("[a-zA-Z0-9_.\\x00\u{e9}\u{4e2d}]{0,12}", 6)),
    )
        .prop_map(|(blocks, names)| {
            let data: Vec<Data> = blocks.into_iter().map(Data::from).collect();
            let names = names.map(|mut n| {
                n.truncate(data.len());
                n
            });
            NamedCollection::new(data, names).expect("matching lengths")
        })
}

// Property: the size computed up front is exactly the number of bytes written
proptest! {
    #[test]
    fn prop_size_is_exact(list in collection()) {
        let size = ListCodec::compute_encoded_size(Some(&list)).expect("size");
        let mut buf = Vec::new();
        ListCodec::encode(&list, &mut buf).expect("encode");
        prop_assert_eq!(buf.len(), size);
    }
}

// Property: decoding an encoded collection reproduces it
proptest! {
    #[test]
    fn prop_collection_roundtrip(list in collection()) {
        let bytes = ListCodec::to_bytes(&list).expect("encode");
        let decoded = ListCodec::decode(&mut &bytes[..]).expect("decode");

        prop_assert_eq!(decoded.is_named(), list.is_named());
        prop_assert_eq!(decoded.names(), list.names());
        prop_assert_eq!(decoded, list);
    }
}

// Property: encoding is deterministic
proptest! {
    #[test]
    fn prop_encoding_deterministic(list in collection()) {
        let first = ListCodec::to_bytes(&list).expect("encode");
        let second = ListCodec::to_bytes(&list).expect("encode");
        prop_assert_eq!(first, second);
    }
}

// Property: the chosen layout is never larger than either alternative
proptest! {
    #[test]
    fn prop_block_type_minimal(block in block()) {
        let rows = block.rows() as u64;
        let cols = block.cols() as u64;
        let nnz = block.non_zeros();
        let sparse = 17 + 4 * rows + 12 * nnz;
        let dense = 17 + 8 * rows * cols;

        let size = block.exact_size_on_disk();
        match block.block_type_on_disk() {
            BlockType::Empty => prop_assert_eq!(nnz, 0),
            BlockType::Sparse => prop_assert!(sparse < dense && size == sparse),
            BlockType::Dense => prop_assert!(dense <= sparse && size == dense),
        }
    }
}

// Property: storage layout in memory does not affect the wire bytes
proptest! {
    #[test]
    fn prop_dense_and_sparse_storage_encode_identically(block in dense_block()) {
        let cells: Vec<_> = block.iter_non_zeros().collect();
        let sparse = MatrixBlock::from_triplets(block.rows(), block.cols(), cells).expect("triplets");

        let mut a = Vec::new();
        let mut b = Vec::new();
        block.write_to(&mut a);
        sparse.write_to(&mut b);
        prop_assert_eq!(a, b);
    }
}

// Property: the decoder never panics on arbitrary input
proptest! {
    #[test]
    fn prop_decode_arbitrary_bytes(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = ListCodec::decode(&mut &data[..]);
        let _ = RpcCall::from_bytes(&data);
    }
}

// Property: any strict prefix of a non-empty encoding is rejected
proptest! {
    #[test]
    fn prop_truncation_rejected(list in collection(), cut in any::<prop::sample::Index>()) {
        let bytes = ListCodec::to_bytes(&list).expect("encode");
        let cut = 1 + cut.index(bytes.len() - 1);
        let truncated = &bytes[..cut];
        prop_assert!(ListCodec::decode(&mut &truncated[..]).is_err());
    }
}

// Property: push calls survive the envelope unchanged
proptest! {
    #[test]
    fn prop_push_call_roundtrip(worker in any::<i32>(), list in collection()) {
        let call = RpcCall::push(worker, list);
        let bytes = call.to_bytes().expect("encode");
        prop_assert_eq!(bytes.len(), call.encoded_size().expect("size"));
        prop_assert_eq!(RpcCall::from_bytes(&bytes).expect("decode"), call);
    }
}
