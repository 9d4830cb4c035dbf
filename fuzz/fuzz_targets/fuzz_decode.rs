#![no_main]

use libfuzzer_sys::fuzz_target;
use paramserv_rpc::core::list_codec::ListCodec;
use paramserv_rpc::protocol::message::{RpcCall, RpcMessage, RpcResponse};

fuzz_target!(|data: &[u8]| {
    // Decoders must reject bad input with an error, never a panic or a huge allocation
    if let Ok(list) = ListCodec::decode(&mut &data[..]) {
        // anything accepted must re-encode to a buffer of the predicted size
        if let Ok(size) = ListCodec::compute_encoded_size(Some(&list)) {
            let bytes = ListCodec::to_bytes(&list).expect("decoded collection re-encodes");
            assert_eq!(bytes.len(), size);
        }
    }
    let _ = RpcCall::from_bytes(data);
    let _ = RpcResponse::from_bytes(data);
});
