#![no_main]

use area_protocol::codec::{decode_frame, encode_frame, MAX_FRAME_PAYLOAD};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut encoded) = encode_frame(data) {
        let decoded = decode_frame(&mut encoded, MAX_FRAME_PAYLOAD)
            .expect("encoded frame must decode");
        assert_eq!(&decoded[..], data);
    }
});
